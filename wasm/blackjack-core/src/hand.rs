use serde::{Deserialize, Serialize};

use crate::deck::{Card, Rank};

pub const BLACKJACK: u32 = 21;

fn evaluate(cards: &[Card]) -> (u32, u32) {
    let mut total = 0;
    let mut aces = 0;

    for card in cards {
        total += card.value();
        if card.rank == Rank::Ace { aces += 1; }
    }

    while total > BLACKJACK && aces > 0 {
        total -= 10;
        aces -= 1;
    }

    (total, aces)
}

/// Best total for the cards, counting each ace as 11 unless that would bust.
pub fn hand_value(cards: &[Card]) -> u32 {
    evaluate(cards).0
}

/// True when an ace is still being counted as 11.
pub fn is_soft(cards: &[Card]) -> bool {
    let (total, aces) = evaluate(cards);
    aces > 0 && total <= BLACKJACK
}

pub fn is_blackjack(cards: &[Card]) -> bool {
    cards.len() == 2 && hand_value(cards) == BLACKJACK
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Hand::default()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn value(&self) -> u32 {
        hand_value(&self.cards)
    }

    pub fn is_bust(&self) -> bool {
        self.value() > BLACKJACK
    }
}

impl From<Vec<Card>> for Hand {
    fn from(cards: Vec<Card>) -> Self {
        Hand { cards }
    }
}
