use crate::protocol::message::Bet;

/// Number drawn for the round.
pub const WINNING_NUMBER: u32 = 7574;

/// Default winning rule: a bet wins when it wagered the drawn number.
pub fn winning_bet(bet: &Bet) -> bool {
    bet.number == WINNING_NUMBER
}

/// The outcome of the draw: every winning bet, over all agencies.
///
/// Computed once after all agencies have finished submitting, then shared
/// read-only with the delivery workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerSet {
    winners: Vec<Bet>,
}

impl WinnerSet {
    /// Evaluates the winning rule over the complete bet collection.
    pub fn compute<F>(bets: &[Bet], is_winner: F) -> Self
    where
        F: Fn(&Bet) -> bool,
    {
        let winners = bets.iter().filter(|bet| is_winner(bet)).cloned().collect();

        Self { winners }
    }

    /// Documents of the winning bets submitted by a single agency.
    pub fn documents(&self, agency: u16) -> Vec<String> {
        self.winners
            .iter()
            .filter(|bet| bet.agency == agency)
            .map(|bet| bet.document.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.winners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn bet(agency: u16, document: &str, number: u32) -> Bet {
        Bet {
            agency,
            document: document.into(),
            first_name: "Ana".into(),
            last_name: "Gomez".into(),
            birthdate: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            number,
        }
    }

    #[test]
    fn draw_is_deterministic() {
        let bets = vec![
            bet(1, "11111111", WINNING_NUMBER),
            bet(2, "22222222", 100),
            bet(3, "33333333", WINNING_NUMBER),
        ];

        let first = WinnerSet::compute(&bets, winning_bet);
        let second = WinnerSet::compute(&bets, winning_bet);

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(!first.is_empty());
    }

    #[test]
    fn documents_are_filtered_by_agency() {
        let bets = vec![
            bet(1, "11111111", WINNING_NUMBER),
            bet(1, "44444444", WINNING_NUMBER),
            bet(2, "22222222", WINNING_NUMBER),
            bet(2, "55555555", 3),
        ];
        let winners = WinnerSet::compute(&bets, winning_bet);

        assert_eq!(winners.documents(1), vec!["11111111", "44444444"]);
        assert_eq!(winners.documents(2), vec!["22222222"]);
        assert!(winners.documents(3).is_empty());
    }

    #[test]
    fn rule_is_injectable() {
        let bets = vec![bet(1, "11111111", 1), bet(1, "22222222", 2)];
        let winners = WinnerSet::compute(&bets, |bet| bet.number % 2 == 0);

        assert_eq!(winners.documents(1), vec!["22222222"]);
    }
}
