use js_sys::Function;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod deck;
pub mod error;
pub mod game;
pub mod hand;
mod logging;
pub mod view;

use config::TableConfig;
use deck::Card;
use game::{Action, RoundState};
use view::RoundView;

fn emit(on_event: &Option<Function>, action: Action, next: &RoundState) {
    if let Some(callback) = on_event {
        for name in view::transition_events(action, next) {
            let _ = callback.call1(&JsValue::NULL, &JsValue::from_str(name));
        }
    }
}

fn read_state(state: &JsValue) -> Result<RoundState, JsValue> {
    let state: RoundState = serde_wasm_bindgen::from_value(state.clone())
        .map_err(|err| JsValue::from_str(&format!("Invalid state: {err}")))?;
    state
        .validate()
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    Ok(state)
}

fn write_state(state: &RoundState) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(state)
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}

#[wasm_bindgen]
pub fn start_round(params: &JsValue, on_event: Option<Function>) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let config: TableConfig = if params.is_undefined() || params.is_null() {
        TableConfig::default()
    } else {
        serde_wasm_bindgen::from_value(params.clone())
            .map_err(|err| JsValue::from_str(&format!("Invalid input: {err}")))?
    };
    logging::init(&config);

    let state = game::start_round(&mut config.rng())
        .map_err(|err| JsValue::from_str(&format!("Deal failed: {err}")))?;
    emit(&on_event, Action::Deal, &state);
    write_state(&state)
}

#[wasm_bindgen]
pub fn hit(state: &JsValue, on_event: Option<Function>) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let next = read_state(state)?
        .hit()
        .map_err(|err| JsValue::from_str(&format!("Hit failed: {err}")))?;
    emit(&on_event, Action::Hit, &next);
    write_state(&next)
}

#[wasm_bindgen]
pub fn stand(state: &JsValue, on_event: Option<Function>) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let next = read_state(state)?
        .stand()
        .map_err(|err| JsValue::from_str(&format!("Stand failed: {err}")))?;
    emit(&on_event, Action::Stand, &next);
    write_state(&next)
}

#[wasm_bindgen]
pub fn hand_value(cards: &JsValue) -> Result<u32, JsValue> {
    console_error_panic_hook::set_once();
    let cards: Vec<Card> = serde_wasm_bindgen::from_value(cards.clone())
        .map_err(|err| JsValue::from_str(&format!("Invalid input: {err}")))?;
    Ok(hand::hand_value(&cards))
}

#[wasm_bindgen]
pub fn describe_round(state: &JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let state = read_state(state)?;
    serde_wasm_bindgen::to_value(&RoundView::from(&state))
        .map_err(|err| JsValue::from_str(&format!("Serialization failed: {err}")))
}
