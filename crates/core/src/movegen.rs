use crate::game::{Board, BoardPos, Color, CoordOffsetTyp, Move, Piece, PieceKind};

type Offset = (CoordOffsetTyp, CoordOffsetTyp);

pub const ROOK_DIRECTIONS: [Offset; 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub const BISHOP_DIRECTIONS: [Offset; 4] = [(1, 1), (-1, -1), (1, -1), (-1, 1)];

pub const KNIGHT_OFFSETS: [Offset; 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

pub const KING_OFFSETS: [Offset; 8] = [
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
];

impl Board {
    /// Rays in each direction, stopping at (and including an enemy on) the
    /// first occupied square.
    fn generate_sliding_moves(
        &self,
        pos: BoardPos,
        color: Color,
        directions: &[Offset],
        moves: &mut Vec<Move>,
    ) {
        for &offset in directions {
            let mut current_pos = pos.add_offset(offset);

            while let Some(p) = current_pos {
                match self[p] {
                    None => {
                        moves.push(Move::new(pos, p));
                        current_pos = p.add_offset(offset);
                    }
                    Some(piece) => {
                        if piece.is_opponent(color) {
                            moves.push(Move::new_capture(pos, p));
                        }
                        break;
                    }
                }
            }
        }
    }

    fn generate_offsetting_moves(
        &self,
        pos: BoardPos,
        color: Color,
        offsets: &[Offset],
        moves: &mut Vec<Move>,
    ) {
        for &offset in offsets {
            if let Some(dest) = pos.add_offset(offset) {
                match self[dest] {
                    None => moves.push(Move::new(pos, dest)),
                    Some(piece) if piece.is_opponent(color) => {
                        moves.push(Move::new_capture(pos, dest))
                    }
                    Some(_) => {}
                }
            }
        }
    }

    fn push_pawn_move(from: BoardPos, to: BoardPos, capture: bool, moves: &mut Vec<Move>) {
        if to.rank == 0 || to.rank == 7 {
            for kind in PieceKind::PROMOTIONS {
                moves.push(Move::new_promotion(from, to, kind, capture));
            }
        } else if capture {
            moves.push(Move::new_capture(from, to));
        } else {
            moves.push(Move::new(from, to));
        }
    }

    fn generate_pawn_moves(&self, pos: BoardPos, color: Color, moves: &mut Vec<Move>) {
        let rank_offset = color.pawn_direction();
        let starting_rank = color.home_rank().wrapping_add_signed(rank_offset);

        // Square in front of pawn
        if let Some(single) = pos.add_offset((0, rank_offset)) {
            if self[single].is_none() {
                Self::push_pawn_move(pos, single, false, moves);

                if pos.rank == starting_rank {
                    if let Some(double) = single.add_offset((0, rank_offset)) {
                        if self[double].is_none() {
                            moves.push(Move::new_double_push(pos, double));
                        }
                    }
                }
            }
        }

        // Take to both sides
        for file_offset in [-1, 1] {
            let Some(dest) = pos.add_offset((file_offset, rank_offset)) else {
                continue;
            };

            match self[dest] {
                Some(piece) if piece.is_opponent(color) => {
                    Self::push_pawn_move(pos, dest, true, moves)
                }
                None if self.en_passant() == Some(dest) && color == self.side_to_move() => {
                    moves.push(Move::new_en_passant(pos, dest))
                }
                _ => {}
            }
        }
    }

    fn generate_castling_moves(&self, pos: BoardPos, color: Color, moves: &mut Vec<Move>) {
        let rank = color.home_rank();
        if pos != BoardPos::new(Self::CASTLE_FROM_FILE, rank) {
            return;
        }

        let enemy = !color;
        if self.is_square_attacked(pos, enemy) {
            // King is in check
            return;
        }

        // (king side, rook file, files that must be empty, files the king crosses, king destination)
        let sides: [(bool, u8, &[u8], &[u8], u8); 2] =
            [(true, 7, &[5, 6], &[5, 6], 6), (false, 0, &[1, 2, 3], &[3, 2], 2)];

        for (king_side, rook_file, empty_files, crossed_files, to_file) in sides {
            if !self.castling().get(color, king_side) {
                continue;
            }

            let rook_home = BoardPos::new(rook_file, rank);
            if self[rook_home] != Some(Piece::new(color, PieceKind::Rook)) {
                continue;
            }

            if empty_files
                .iter()
                .any(|&file| self[BoardPos::new(file, rank)].is_some())
            {
                continue;
            }

            if crossed_files
                .iter()
                .any(|&file| self.is_square_attacked(BoardPos::new(file, rank), enemy))
            {
                continue;
            }

            moves.push(Move::new_castle(pos, BoardPos::new(to_file, rank)));
        }
    }

    /// Pseudo-legal moves of whatever piece stands on `pos`, for its own
    /// colour. Castling is only generated when `consider_castling` is set.
    pub fn generate_moves_at(&self, pos: BoardPos, moves: &mut Vec<Move>, consider_castling: bool) {
        let Some(piece) = self[pos] else {
            return;
        };
        let color = piece.color;

        match piece.kind {
            PieceKind::Pawn => self.generate_pawn_moves(pos, color, moves),
            PieceKind::Knight => {
                self.generate_offsetting_moves(pos, color, &KNIGHT_OFFSETS, moves)
            }
            PieceKind::Bishop => {
                self.generate_sliding_moves(pos, color, &BISHOP_DIRECTIONS, moves)
            }
            PieceKind::Rook => self.generate_sliding_moves(pos, color, &ROOK_DIRECTIONS, moves),
            PieceKind::Queen => {
                self.generate_sliding_moves(pos, color, &ROOK_DIRECTIONS, moves);
                self.generate_sliding_moves(pos, color, &BISHOP_DIRECTIONS, moves);
            }
            PieceKind::King => {
                self.generate_offsetting_moves(pos, color, &KING_OFFSETS, moves);
                if consider_castling {
                    self.generate_castling_moves(pos, color, moves);
                }
            }
        }
    }

    /// All pseudo-legal moves for the side to move, in board-scan order.
    pub fn generate_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        let color = self.side_to_move();

        for (pos, piece) in self.pieces() {
            if piece.color == color {
                self.generate_moves_at(pos, &mut moves, true);
            }
        }

        moves
    }

    /// Pseudo-legal moves that do not leave the mover's king attacked.
    pub fn generate_legal_moves(&self) -> Vec<Move> {
        let color = self.side_to_move();
        let mut scratch = self.clone();

        self.generate_moves()
            .into_iter()
            .filter(|m| {
                let undo = scratch.apply(m);
                let safe = scratch
                    .king_pos(color)
                    .map_or(true, |king| !scratch.is_square_attacked(king, !color));
                scratch.undo(m, undo);
                safe
            })
            .collect()
    }

    /// Whether any piece of `by` attacks `pos`. Occupancy of `pos` itself is
    /// irrelevant.
    pub fn is_square_attacked(&self, pos: BoardPos, by: Color) -> bool {
        let holds = |p: Option<BoardPos>, kind: PieceKind| {
            p.and_then(|p| self[p]).is_some_and(|piece| piece.is(by, kind))
        };

        // A pawn of `by` attacks diagonally forward, so it sits one rank behind
        let behind = -by.pawn_direction();
        if [-1, 1]
            .into_iter()
            .any(|df| holds(pos.add_offset((df, behind)), PieceKind::Pawn))
        {
            return true;
        }

        if KNIGHT_OFFSETS
            .iter()
            .any(|&o| holds(pos.add_offset(o), PieceKind::Knight))
        {
            return true;
        }

        if KING_OFFSETS
            .iter()
            .any(|&o| holds(pos.add_offset(o), PieceKind::King))
        {
            return true;
        }

        self.slider_attacks(pos, by, &ROOK_DIRECTIONS, PieceKind::Rook)
            || self.slider_attacks(pos, by, &BISHOP_DIRECTIONS, PieceKind::Bishop)
    }

    /// Looks along each ray for the first piece; a `by` slider of `kind` or a
    /// `by` queen there attacks `pos`.
    fn slider_attacks(
        &self,
        pos: BoardPos,
        by: Color,
        directions: &[Offset],
        kind: PieceKind,
    ) -> bool {
        directions.iter().any(|&offset| {
            let mut current_pos = pos.add_offset(offset);
            while let Some(p) = current_pos {
                if let Some(piece) = self[p] {
                    return piece.color == by
                        && (piece.kind == kind || piece.kind == PieceKind::Queen);
                }
                current_pos = p.add_offset(offset);
            }
            false
        })
    }

    /// Whether the side to move has a legal en-passant capture right now.
    pub fn can_capture_en_passant(&self) -> bool {
        let Some(target) = self.en_passant() else {
            return false;
        };

        let color = self.side_to_move();
        let mut moves = Vec::new();
        for df in [-1, 1] {
            if let Some(pos) = target.add_offset((df, -color.pawn_direction())) {
                if self[pos].is_some_and(|p| p.is(color, PieceKind::Pawn)) {
                    self.generate_moves_at(pos, &mut moves, false);
                }
            }
        }

        let mut scratch = self.clone();
        moves.into_iter().filter(|m| m.flags.en_passant).any(|m| {
            let undo = scratch.apply(&m);
            let safe = scratch
                .king_pos(color)
                .map_or(true, |king| !scratch.is_square_attacked(king, !color));
            scratch.undo(&m, undo);
            safe
        })
    }

    /// Whether the side to move's king is attacked.
    pub fn in_check(&self) -> bool {
        let color = self.side_to_move();
        self.king_pos(color)
            .is_some_and(|king| self.is_square_attacked(king, !color))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::game::{Board, BoardPos, Color, Move, PieceKind};

    fn coords(moves: &[Move]) -> Vec<String> {
        moves.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn start_position_has_twenty_moves() {
        let moves = Board::default().generate_legal_moves();
        assert_eq!(moves.len(), 20);
        // Board-scan order: knights on the first rank, then pawns a2..h2
        assert_eq!(
            coords(&moves[..6]),
            ["b1c3", "b1a3", "g1h3", "g1f3", "a2a3", "a2a4"]
        );
        assert!(moves[5].flags.double_push);
    }

    #[test]
    fn pinned_piece_cannot_move() {
        let board = Board::from_fen("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
        let moves = board.generate_legal_moves();
        assert!(moves
            .iter()
            .all(|m| m.from_pos != BoardPos::from_str("e2").unwrap()));
    }

    #[test]
    fn en_passant_is_generated() {
        let board =
            Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let moves = board.generate_legal_moves();
        let ep = moves.iter().find(|m| m.flags.en_passant).unwrap();
        assert_eq!(ep.to_string(), "e5d6");
        assert!(ep.is_capture());
    }

    #[test]
    fn en_passant_exposing_king_is_illegal() {
        let board =
            Board::from_fen("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 2").unwrap();
        assert!(board.generate_legal_moves().iter().all(|m| !m.flags.en_passant));
    }

    #[test]
    fn en_passant_availability() {
        let open = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        assert!(open.can_capture_en_passant());

        let pinned = Board::from_fen("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 2").unwrap();
        assert!(!pinned.can_capture_en_passant());

        let mut no_neighbour = Board::default();
        no_neighbour.apply(&Move::new_double_push(
            BoardPos::from_str("e2").unwrap(),
            BoardPos::from_str("e4").unwrap(),
        ));
        assert!(no_neighbour.en_passant().is_some());
        assert!(!no_neighbour.can_capture_en_passant());
    }

    #[test]
    fn promotions_come_in_fours() {
        let board = Board::from_fen("3r3k/4P3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let moves = board.generate_legal_moves();
        let promotions = moves.iter().filter(|m| m.promotion.is_some()).collect::<Vec<_>>();
        assert_eq!(promotions.len(), 8);
        assert_eq!(
            promotions.iter().filter(|m| m.is_capture()).count(),
            4
        );
        assert_eq!(promotions[0].promotion, Some(PieceKind::Queen));
    }

    #[test]
    fn castling_both_sides() {
        let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let castles = board
            .generate_legal_moves()
            .into_iter()
            .filter(|m| m.flags.castling)
            .collect::<Vec<_>>();
        assert_eq!(coords(&castles), ["e1g1", "e1c1"]);
    }

    #[test]
    fn castling_through_attack_is_refused() {
        // Black rook on f8 covers f1, b-file attack does not matter for queen side
        let board = Board::from_fen("1r3rk1/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let castles = board
            .generate_legal_moves()
            .into_iter()
            .filter(|m| m.flags.castling)
            .collect::<Vec<_>>();
        assert_eq!(coords(&castles), ["e1c1"]);
    }

    #[test]
    fn no_castling_out_of_check() {
        let board = Board::from_fen("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        assert!(board.in_check());
        assert!(board.generate_legal_moves().iter().all(|m| !m.flags.castling));
    }

    #[test]
    fn attack_detection() {
        let board = Board::default();
        assert!(board.is_square_attacked(BoardPos::from_str("f3").unwrap(), Color::White));
        assert!(!board.is_square_attacked(BoardPos::from_str("e4").unwrap(), Color::White));
        assert!(board.is_square_attacked(BoardPos::from_str("d6").unwrap(), Color::Black));
        assert!(!board.in_check());
    }

    #[test]
    fn checkmate_and_stalemate_are_empty() {
        let mate = Board::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert!(mate.generate_legal_moves().is_empty());
        assert!(mate.in_check());

        let stalemate = Board::from_fen("7k/5Q2/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert!(stalemate.generate_legal_moves().is_empty());
        assert!(!stalemate.in_check());
    }
}
