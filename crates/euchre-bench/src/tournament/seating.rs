use euchre_core::model::player::{PlayerPosition, Team};

/// Which side each configured team plays in one game, and who deals first.
///
/// With swapping enabled games come in pairs that share a deal seed: the second
/// game of a pair replays the same cards with the teams exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seating {
    pub swapped: bool,
    pub first_dealer: PlayerPosition,
}

impl Seating {
    pub fn for_game(game_index: usize, swap_seats: bool) -> Self {
        let (swapped, deal_index) = if swap_seats {
            (game_index % 2 == 1, game_index / 2)
        } else {
            (false, game_index)
        };
        Self {
            swapped,
            first_dealer: PlayerPosition::LOOP[deal_index % 4],
        }
    }

    /// Whether this game starts a new deal seed.
    pub fn fresh_deal(game_index: usize, swap_seats: bool) -> bool {
        !swap_seats || game_index % 2 == 0
    }

    /// Side played by team `agent` (0 or 1 in config order).
    pub fn side_of(&self, agent: usize) -> Team {
        if (agent == 0) != self.swapped {
            Team::NorthSouth
        } else {
            Team::EastWest
        }
    }

    /// Configured team sitting at `seat`.
    pub fn agent_at(&self, seat: PlayerPosition) -> usize {
        self.agent_on(seat.team())
    }

    pub fn agent_on(&self, side: Team) -> usize {
        if (side == Team::NorthSouth) != self.swapped {
            0
        } else {
            1
        }
    }
}
