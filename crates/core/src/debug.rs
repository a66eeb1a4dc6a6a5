use crate::game::Board;

/// Move-path enumeration counters, as tabulated for the well-known perft
/// reference positions. Everything except `nodes` is counted on the final ply.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct PerftStats {
    pub nodes: usize,
    pub captures: usize,
    pub en_passant: usize,
    pub castles: usize,
    pub promotions: usize,
    pub checks: usize,
    pub checkmates: usize,
}

impl std::ops::Add for PerftStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            nodes: self.nodes + rhs.nodes,
            captures: self.captures + rhs.captures,
            en_passant: self.en_passant + rhs.en_passant,
            castles: self.castles + rhs.castles,
            promotions: self.promotions + rhs.promotions,
            checks: self.checks + rhs.checks,
            checkmates: self.checkmates + rhs.checkmates,
        }
    }
}

impl std::ops::AddAssign for PerftStats {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.clone() + rhs;
    }
}

pub fn perft(board: &Board, depth: usize) -> PerftStats {
    if depth == 0 {
        return PerftStats {
            nodes: 1,
            ..Default::default()
        };
    }

    let mut scratch = board.clone();
    perft_inner(&mut scratch, depth)
}

fn perft_inner(board: &mut Board, depth: usize) -> PerftStats {
    let mut stats = PerftStats::default();
    let moves = board.generate_legal_moves();

    for m in moves {
        let undo = board.apply(&m);

        if depth == 1 {
            stats.nodes += 1;
            stats.captures += m.flags.capture as usize;
            stats.en_passant += m.flags.en_passant as usize;
            stats.castles += m.flags.castling as usize;
            stats.promotions += m.promotion.is_some() as usize;

            if board.in_check() {
                stats.checks += 1;
                if board.generate_legal_moves().is_empty() {
                    stats.checkmates += 1;
                }
            }
        } else {
            stats += perft_inner(board, depth - 1);
        }

        board.undo(&m, undo);
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_depth_two() {
        let stats = perft(&Board::default(), 2);
        assert_eq!(
            stats,
            PerftStats {
                nodes: 400,
                ..Default::default()
            }
        );
    }

    #[test]
    fn kiwipete_depth_two_breakdown() {
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let stats = perft(&board, 2);
        assert_eq!(stats.nodes, 2039);
        assert_eq!(stats.captures, 351);
        assert_eq!(stats.en_passant, 1);
        assert_eq!(stats.castles, 91);
        assert_eq!(stats.promotions, 0);
        assert_eq!(stats.checks, 3);
        assert_eq!(stats.checkmates, 0);
    }

    #[test]
    fn depth_zero_is_one_node() {
        assert_eq!(perft(&Board::default(), 0).nodes, 1);
    }
}
