use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    deck::{Card, Deck, DECK_SIZE},
    error::RoundError,
    hand::{Hand, BLACKJACK},
};

/// The dealer keeps drawing while below this total.
pub const DEALER_STANDS_ON: u32 = 17;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    NotStarted,
    PlayerTurn,
    DealerTurn,
    RoundOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::NotStarted => "not started",
            Phase::PlayerTurn => "player turn",
            Phase::DealerTurn => "dealer turn",
            Phase::RoundOver => "round over",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Deal,
    Hit,
    Stand,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Deal => "deal",
            Action::Hit => "hit",
            Action::Stand => "stand",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    PlayerBust,
    DealerBust,
    PlayerWins,
    DealerWins,
    Tie,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Winner {
    Player,
    Dealer,
    Tie,
}

impl Outcome {
    pub fn winner(self) -> Winner {
        match self {
            Outcome::PlayerBust | Outcome::DealerWins => Winner::Dealer,
            Outcome::DealerBust | Outcome::PlayerWins => Winner::Player,
            Outcome::Tie => Winner::Tie,
        }
    }
}

/// Settles a finished round from the two final totals.
pub fn determine_outcome(player_value: u32, dealer_value: u32) -> Outcome {
    if player_value > BLACKJACK {
        Outcome::PlayerBust
    } else if dealer_value > BLACKJACK {
        Outcome::DealerBust
    } else if player_value > dealer_value {
        Outcome::PlayerWins
    } else if dealer_value > player_value {
        Outcome::DealerWins
    } else {
        Outcome::Tie
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    pub deck: Deck,
    pub player: Hand,
    pub dealer: Hand,
    pub phase: Phase,
    pub outcome: Option<Outcome>,
}

/// Shuffles a fresh deck and deals the opening hands.
pub fn start_round<R: Rng + ?Sized>(rng: &mut R) -> Result<RoundState, RoundError> {
    RoundState::new(Deck::shuffled(rng)).deal()
}

impl RoundState {
    pub fn new(deck: Deck) -> Self {
        RoundState {
            deck,
            player: Hand::new(),
            dealer: Hand::new(),
            phase: Phase::NotStarted,
            outcome: None,
        }
    }

    fn expect_phase(&self, action: Action, phase: Phase) -> Result<(), RoundError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(RoundError::InvalidAction {
                action,
                phase: self.phase,
            })
        }
    }

    pub fn deal(&self) -> Result<RoundState, RoundError> {
        self.expect_phase(Action::Deal, Phase::NotStarted)?;
        let mut next = self.clone();
        for _ in 0..2 {
            let card = next.deck.draw()?;
            next.player.push(card);
            let card = next.deck.draw()?;
            next.dealer.push(card);
        }
        next.phase = Phase::PlayerTurn;
        debug!(
            player = next.player.value(),
            dealer = next.dealer.value(),
            "opening hands dealt"
        );
        Ok(next)
    }

    pub fn hit(&self) -> Result<RoundState, RoundError> {
        self.expect_phase(Action::Hit, Phase::PlayerTurn)?;
        let mut next = self.clone();
        let card = next.deck.draw()?;
        next.player.push(card);
        let value = next.player.value();
        debug!(card = %card, value, "player hits");

        if value > BLACKJACK {
            next.finish(determine_outcome(value, next.dealer.value()));
        }
        Ok(next)
    }

    pub fn stand(&self) -> Result<RoundState, RoundError> {
        self.expect_phase(Action::Stand, Phase::PlayerTurn)?;
        let mut next = self.clone();
        next.phase = Phase::DealerTurn;
        next.play_dealer()?;
        let outcome = determine_outcome(next.player.value(), next.dealer.value());
        next.finish(outcome);
        Ok(next)
    }

    fn play_dealer(&mut self) -> Result<(), RoundError> {
        while self.dealer.value() < DEALER_STANDS_ON {
            let card = self.deck.draw()?;
            self.dealer.push(card);
            debug!(card = %card, value = self.dealer.value(), "dealer draws");
        }
        Ok(())
    }

    fn finish(&mut self, outcome: Outcome) {
        self.phase = Phase::RoundOver;
        self.outcome = Some(outcome);
        info!(
            ?outcome,
            player = self.player.value(),
            dealer = self.dealer.value(),
            "round over"
        );
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::RoundOver
    }

    pub fn winner(&self) -> Option<Winner> {
        self.outcome.map(Outcome::winner)
    }

    /// Score line shown under "Dealer Hand - Player Hand" once the round ends.
    pub fn score_label(&self) -> Option<String> {
        let player = self.player.value();
        let label = match self.outcome? {
            Outcome::PlayerBust => "Bust!".to_string(),
            Outcome::DealerBust => format!("Bust! - {player}"),
            _ => format!("{} - {player}", self.dealer.value()),
        };
        Some(label)
    }

    /// Checks a state received from outside the engine: the three piles must
    /// hold the 52 distinct cards and the phase must agree with the hands.
    pub fn validate(&self) -> Result<(), RoundError> {
        let all: Vec<Card> = self
            .deck
            .cards()
            .iter()
            .chain(self.player.cards())
            .chain(self.dealer.cards())
            .copied()
            .collect();
        if all.len() != DECK_SIZE {
            return Err(RoundError::InvalidState(format!(
                "expected {DECK_SIZE} cards in play, found {}",
                all.len()
            )));
        }
        let unique: HashSet<Card> = all.iter().copied().collect();
        if unique.len() != DECK_SIZE {
            return Err(RoundError::InvalidState("duplicate cards in play".to_string()));
        }

        let consistent = match self.phase {
            Phase::NotStarted => {
                self.player.is_empty() && self.dealer.is_empty() && self.outcome.is_none()
            }
            Phase::PlayerTurn => {
                self.player.len() >= 2
                    && self.dealer.len() == 2
                    && !self.player.is_bust()
                    && self.outcome.is_none()
            }
            Phase::DealerTurn => false,
            Phase::RoundOver => {
                let settled = determine_outcome(self.player.value(), self.dealer.value());
                let dealer_done = match settled {
                    Outcome::PlayerBust => self.dealer.len() == 2,
                    _ => self.dealer.value() >= DEALER_STANDS_ON,
                };
                self.player.len() >= 2 && self.outcome == Some(settled) && dealer_done
            }
        };
        if !consistent {
            return Err(RoundError::InvalidState(format!(
                "hands do not match phase {}",
                self.phase
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, SeedableRng};
    use rstest::rstest;

    use super::*;
    use crate::deck::{Rank, Suit};

    /// Full deck whose first draws are `draws`, in order.
    fn stacked(draws: &[Card]) -> Deck {
        let mut cards: Vec<Card> = Deck::canonical()
            .cards()
            .iter()
            .copied()
            .filter(|card| !draws.contains(card))
            .collect();
        cards.extend(draws.iter().rev().copied());
        Deck::from_cards(cards)
    }

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    #[test]
    fn deal_alternates_player_and_dealer() {
        let deck = stacked(&[
            card(Rank::Two, Suit::Spades),
            card(Rank::Three, Suit::Spades),
            card(Rank::Four, Suit::Spades),
            card(Rank::Five, Suit::Spades),
        ]);
        let state = RoundState::new(deck).deal().unwrap();
        assert_eq!(state.phase, Phase::PlayerTurn);
        assert_eq!(
            state.player.cards(),
            &[card(Rank::Two, Suit::Spades), card(Rank::Four, Suit::Spades)]
        );
        assert_eq!(
            state.dealer.cards(),
            &[card(Rank::Three, Suit::Spades), card(Rank::Five, Suit::Spades)]
        );
        assert_eq!(state.deck.remaining(), 48);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn start_round_is_seeded() {
        let a = start_round(&mut SmallRng::seed_from_u64(5)).unwrap();
        let b = start_round(&mut SmallRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.player.len(), 2);
        assert_eq!(a.dealer.len(), 2);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn hit_below_21_stays_in_player_turn() {
        let deck = stacked(&[
            card(Rank::Two, Suit::Spades),
            card(Rank::Ten, Suit::Hearts),
            card(Rank::Three, Suit::Spades),
            card(Rank::Seven, Suit::Hearts),
            card(Rank::Four, Suit::Spades),
        ]);
        let state = RoundState::new(deck).deal().unwrap();
        let next = state.hit().unwrap();
        assert_eq!(next.phase, Phase::PlayerTurn);
        assert_eq!(next.player.value(), 9);
        assert_eq!(next.outcome, None);
        // the input state is untouched
        assert_eq!(state.player.len(), 2);
    }

    #[test]
    fn hitting_past_21_busts_the_player() {
        let deck = stacked(&[
            card(Rank::King, Suit::Spades),
            card(Rank::Two, Suit::Hearts),
            card(Rank::Queen, Suit::Spades),
            card(Rank::Three, Suit::Hearts),
            card(Rank::Five, Suit::Clubs),
        ]);
        let state = RoundState::new(deck).deal().unwrap().hit().unwrap();
        assert_eq!(state.phase, Phase::RoundOver);
        assert_eq!(state.outcome, Some(Outcome::PlayerBust));
        assert_eq!(state.winner(), Some(Winner::Dealer));
        assert_eq!(state.score_label().as_deref(), Some("Bust!"));
        // dealer does not draw after a player bust
        assert_eq!(state.dealer.len(), 2);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn dealer_draws_to_17_and_stops() {
        let deck = stacked(&[
            card(Rank::Ten, Suit::Spades),
            card(Rank::Two, Suit::Hearts),
            card(Rank::Nine, Suit::Spades),
            card(Rank::Three, Suit::Hearts),
            card(Rank::Four, Suit::Hearts),
            card(Rank::Eight, Suit::Hearts),
            card(Rank::King, Suit::Clubs),
        ]);
        let state = RoundState::new(deck).deal().unwrap().stand().unwrap();
        // 2 + 3 + 4 = 9, + 8 = 17; the king is never drawn
        assert_eq!(state.dealer.value(), 17);
        assert_eq!(state.dealer.len(), 4);
        assert_eq!(state.outcome, Some(Outcome::PlayerWins));
        assert_eq!(state.score_label().as_deref(), Some("17 - 19"));
    }

    #[test]
    fn dealer_standing_hand_draws_nothing() {
        let deck = stacked(&[
            card(Rank::Ten, Suit::Spades),
            card(Rank::King, Suit::Hearts),
            card(Rank::Eight, Suit::Spades),
            card(Rank::Seven, Suit::Hearts),
        ]);
        let state = RoundState::new(deck).deal().unwrap().stand().unwrap();
        assert_eq!(state.dealer.len(), 2);
        assert_eq!(state.outcome, Some(Outcome::PlayerWins));
    }

    #[test]
    fn dealer_bust_pays_the_player() {
        let deck = stacked(&[
            card(Rank::Ten, Suit::Spades),
            card(Rank::Ten, Suit::Hearts),
            card(Rank::Two, Suit::Spades),
            card(Rank::Six, Suit::Hearts),
            card(Rank::Queen, Suit::Clubs),
        ]);
        let state = RoundState::new(deck).deal().unwrap().stand().unwrap();
        assert_eq!(state.dealer.value(), 26);
        assert_eq!(state.outcome, Some(Outcome::DealerBust));
        assert_eq!(state.winner(), Some(Winner::Player));
        assert_eq!(state.score_label().as_deref(), Some("Bust! - 12"));
    }

    #[test]
    fn soft_dealer_hand_demotes_ace_and_keeps_drawing() {
        // dealer A + 5 = 16 soft, draws K -> 16 hard, draws 3 -> 19
        let deck = stacked(&[
            card(Rank::Ten, Suit::Spades),
            card(Rank::Ace, Suit::Hearts),
            card(Rank::Nine, Suit::Spades),
            card(Rank::Five, Suit::Hearts),
            card(Rank::King, Suit::Hearts),
            card(Rank::Three, Suit::Clubs),
        ]);
        let state = RoundState::new(deck).deal().unwrap().stand().unwrap();
        assert_eq!(state.dealer.value(), 19);
        assert_eq!(state.outcome, Some(Outcome::Tie));
        assert_eq!(state.winner(), Some(Winner::Tie));
    }

    #[test]
    fn dealer_exhausting_the_deck_is_reported() {
        let deck = Deck::from_cards(vec![
            card(Rank::Two, Suit::Hearts),
            card(Rank::Ten, Suit::Spades),
            card(Rank::Two, Suit::Clubs),
            card(Rank::Ten, Suit::Hearts),
        ]);
        let state = RoundState::new(deck).deal().unwrap();
        assert_eq!(state.dealer.value(), 4);
        assert_eq!(state.stand(), Err(RoundError::DeckExhausted));
        assert_eq!(state.phase, Phase::PlayerTurn);
    }

    #[rstest]
    #[case(Phase::NotStarted, Action::Hit)]
    #[case(Phase::NotStarted, Action::Stand)]
    #[case(Phase::RoundOver, Action::Hit)]
    #[case(Phase::RoundOver, Action::Stand)]
    #[case(Phase::PlayerTurn, Action::Deal)]
    fn actions_outside_their_phase_are_rejected(#[case] phase: Phase, #[case] action: Action) {
        let mut state = RoundState::new(Deck::canonical());
        state.phase = phase;
        let result = match action {
            Action::Deal => state.deal(),
            Action::Hit => state.hit(),
            Action::Stand => state.stand(),
        };
        assert_eq!(result, Err(RoundError::InvalidAction { action, phase }));
    }

    #[rstest]
    #[case(22, 17, Outcome::PlayerBust)]
    #[case(22, 25, Outcome::PlayerBust)]
    #[case(18, 23, Outcome::DealerBust)]
    #[case(20, 18, Outcome::PlayerWins)]
    #[case(18, 20, Outcome::DealerWins)]
    #[case(19, 19, Outcome::Tie)]
    #[case(21, 21, Outcome::Tie)]
    fn outcomes(#[case] player: u32, #[case] dealer: u32, #[case] expected: Outcome) {
        assert_eq!(determine_outcome(player, dealer), expected);
    }

    #[test]
    fn outcome_is_symmetric_for_standing_hands() {
        for a in 4..=21 {
            for b in 4..=21 {
                let forward = determine_outcome(a, b).winner();
                let swapped = determine_outcome(b, a).winner();
                let expected = match forward {
                    Winner::Player => Winner::Dealer,
                    Winner::Dealer => Winner::Player,
                    Winner::Tie => Winner::Tie,
                };
                assert_eq!(swapped, expected, "player {a} dealer {b}");
            }
        }
    }

    #[test]
    fn validate_rejects_tampered_states() {
        let state = start_round(&mut SmallRng::seed_from_u64(11)).unwrap();

        let mut missing = state.clone();
        missing.deck = Deck::from_cards(state.deck.cards()[1..].to_vec());
        assert!(matches!(missing.validate(), Err(RoundError::InvalidState(_))));

        let mut duplicated = state.clone();
        let mut cards = state.deck.cards().to_vec();
        cards[0] = state.player.cards()[0];
        duplicated.deck = Deck::from_cards(cards);
        assert!(matches!(duplicated.validate(), Err(RoundError::InvalidState(_))));

        let mut finished_without_outcome = state.clone();
        finished_without_outcome.phase = Phase::RoundOver;
        assert!(matches!(
            finished_without_outcome.validate(),
            Err(RoundError::InvalidState(_))
        ));
    }

    #[test]
    fn validate_checks_finished_outcome_against_hands() {
        // player K+Q+5 = 25 against dealer 2+3
        let deck = stacked(&[
            card(Rank::King, Suit::Spades),
            card(Rank::Two, Suit::Hearts),
            card(Rank::Queen, Suit::Spades),
            card(Rank::Three, Suit::Hearts),
            card(Rank::Five, Suit::Clubs),
        ]);
        let busted = RoundState::new(deck).deal().unwrap().hit().unwrap();
        assert!(busted.validate().is_ok());

        let mut relabelled = busted.clone();
        relabelled.outcome = Some(Outcome::PlayerWins);
        assert!(matches!(relabelled.validate(), Err(RoundError::InvalidState(_))));

        // dealer at 5 cannot have finished a standing round
        let deck = stacked(&[
            card(Rank::King, Suit::Spades),
            card(Rank::Two, Suit::Hearts),
            card(Rank::Queen, Suit::Spades),
            card(Rank::Three, Suit::Hearts),
        ]);
        let mut cut_short = RoundState::new(deck).deal().unwrap();
        cut_short.phase = Phase::RoundOver;
        cut_short.outcome = Some(Outcome::PlayerWins);
        assert!(matches!(cut_short.validate(), Err(RoundError::InvalidState(_))));

        let stood = start_round(&mut SmallRng::seed_from_u64(17))
            .unwrap()
            .stand()
            .unwrap();
        assert!(stood.validate().is_ok());
    }

    #[test]
    fn state_survives_serialization() {
        let state = start_round(&mut SmallRng::seed_from_u64(3)).unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["phase"], "playerTurn");
        assert!(json["outcome"].is_null());
        let back: RoundState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
