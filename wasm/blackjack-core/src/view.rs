use serde::Serialize;

use crate::{
    deck::{Card, Color},
    game::{Action, Phase, RoundState, Winner},
    hand::{self, Hand},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub rank: &'static str,
    pub suit: &'static str,
    pub color: Color,
}

impl From<&Card> for CardView {
    fn from(card: &Card) -> Self {
        CardView {
            rank: card.rank.symbol(),
            suit: card.suit.symbol(),
            color: card.suit.color(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandView {
    pub cards: Vec<CardView>,
    pub value: u32,
    pub soft: bool,
    pub blackjack: bool,
}

impl From<&Hand> for HandView {
    fn from(hand: &Hand) -> Self {
        HandView {
            cards: hand.cards().iter().map(CardView::from).collect(),
            value: hand.value(),
            soft: hand::is_soft(hand.cards()),
            blackjack: hand::is_blackjack(hand.cards()),
        }
    }
}

/// Everything the page needs to draw the table for one state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub phase: Phase,
    pub player: HandView,
    pub dealer: HandView,
    pub cards_remaining: usize,
    pub winner: Option<Winner>,
    pub score_label: Option<String>,
}

impl From<&RoundState> for RoundView {
    fn from(state: &RoundState) -> Self {
        RoundView {
            phase: state.phase,
            player: HandView::from(&state.player),
            dealer: HandView::from(&state.dealer),
            cards_remaining: state.deck.remaining(),
            winner: state.winner(),
            score_label: state.score_label(),
        }
    }
}

/// Names passed to the page's `on_event` callback after `action` produced
/// `next`, in the order they fire.
pub fn transition_events(action: Action, next: &RoundState) -> Vec<&'static str> {
    match action {
        Action::Deal => vec!["deal"],
        Action::Hit if next.is_over() => vec!["hit", "bust"],
        Action::Hit => vec!["hit"],
        Action::Stand => vec!["stand", "round_over"],
    }
}
