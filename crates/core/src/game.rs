use std::{
    fmt::{Display, Formatter},
    ops::{Index, IndexMut, Not},
    str::FromStr,
};

use derivative::Derivative;
use log::trace;

use crate::error::{IllegalMoveError, MalformedPositionError};

pub type CoordTyp = u8;
pub type CoordOffsetTyp = i8;

type BoardData = [[Option<Piece>; 8]; 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn is_white(self) -> bool {
        self == Color::White
    }

    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank the pieces of this side start on.
    pub const fn home_rank(self) -> CoordTyp {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Rank offset of a single pawn push.
    pub const fn pawn_direction(self) -> CoordOffsetTyp {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl Not for Color {
    type Output = Color;

    fn not(self) -> Self::Output {
        self.opposite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    /// Promotion choices, in the order they are generated.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// Lowercase letter used by the position notation.
    pub fn to_char(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Pawn => 'p',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Some(match c.to_ascii_lowercase() {
            'k' => PieceKind::King,
            'q' => PieceKind::Queen,
            'r' => PieceKind::Rook,
            'b' => PieceKind::Bishop,
            'n' => PieceKind::Knight,
            'p' => PieceKind::Pawn,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    pub fn is_opponent(self, color: Color) -> bool {
        self.color != color
    }

    pub fn is(self, color: Color, kind: PieceKind) -> bool {
        self.color == color && self.kind == kind
    }

    pub fn opposite(self) -> Self {
        Self::new(!self.color, self.kind)
    }

    pub fn to_char(self) -> char {
        let c = self.kind.to_char();
        if self.color.is_white() {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }

    /// Uppercase letters are white, lowercase black.
    pub fn from_char(c: char) -> Option<Self> {
        let kind = PieceKind::from_char(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };

        Some(Self::new(color, kind))
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_king: bool,
    pub white_queen: bool,
    pub black_king: bool,
    pub black_queen: bool,
}

impl CastlingRights {
    pub const ALL: Self = Self {
        white_king: true,
        white_queen: true,
        black_king: true,
        black_queen: true,
    };

    pub const NONE: Self = Self {
        white_king: false,
        white_queen: false,
        black_king: false,
        black_queen: false,
    };

    pub fn get(&self, color: Color, king_side: bool) -> bool {
        match (color, king_side) {
            (Color::White, true) => self.white_king,
            (Color::White, false) => self.white_queen,
            (Color::Black, true) => self.black_king,
            (Color::Black, false) => self.black_queen,
        }
    }

    /// Rights are only ever removed, never restored (outside of `undo`).
    pub fn revoke(&mut self, color: Color, queen_side: bool, king_side: bool) {
        match color {
            Color::White => {
                self.white_queen &= !queen_side;
                self.white_king &= !king_side;
            }
            Color::Black => {
                self.black_queen &= !queen_side;
                self.black_king &= !king_side;
            }
        }
    }

    /// Revokes whatever right is tied to a rook's home square.
    fn revoke_for_square(&mut self, pos: BoardPos) {
        for color in [Color::White, Color::Black] {
            if pos == BoardPos::new(0, color.home_rank()) {
                self.revoke(color, true, false);
            } else if pos == BoardPos::new(7, color.home_rank()) {
                self.revoke(color, false, true);
            }
        }
    }

    pub fn any(&self) -> bool {
        self.white_king || self.white_queen || self.black_king || self.black_queen
    }

    pub fn mirrored(&self) -> Self {
        Self {
            white_king: self.black_king,
            white_queen: self.black_queen,
            black_king: self.white_king,
            black_queen: self.white_queen,
        }
    }

    pub fn to_fen(&self) -> String {
        if !self.any() {
            return "-".to_string();
        }

        [
            (self.white_king, 'K'),
            (self.white_queen, 'Q'),
            (self.black_king, 'k'),
            (self.black_queen, 'q'),
        ]
        .iter()
        .filter(|(held, _)| *held)
        .map(|(_, c)| c)
        .collect()
    }
}

/// Everything `Board::apply` overwrites and `Board::undo` needs back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoState {
    captured: Option<Piece>,
    castling: CastlingRights,
    en_passant: Option<BoardPos>,
    halfmoves: u32,
    fullmoves: u32,
}

/// Mailbox board. `Hash` skips the two clocks so equal hashes mean "same
/// position" for repetition counting, while `PartialEq` compares every field.
#[derive(Derivative)]
#[derivative(Debug, Clone, Eq, Hash, PartialEq)]
pub struct Board {
    pieces: BoardData,
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<BoardPos>,
    #[derivative(Hash = "ignore")]
    halfmoves: u32,
    #[derivative(Hash = "ignore")]
    fullmoves: u32,
}

impl Board {
    pub const DEFAULT_FEN: &'static str =
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    pub const CASTLE_FROM_FILE: CoordTyp = 4;

    /// A board with no pieces, white to move and no castling rights.
    pub fn empty() -> Self {
        Self {
            pieces: [[None; 8]; 8],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmoves: 0,
            fullmoves: 1,
        }
    }

    pub(crate) fn from_parts(
        pieces: BoardData,
        side_to_move: Color,
        castling: CastlingRights,
        en_passant: Option<BoardPos>,
        halfmoves: u32,
        fullmoves: u32,
    ) -> Self {
        Self {
            pieces,
            side_to_move,
            castling,
            en_passant,
            halfmoves,
            fullmoves,
        }
    }

    /// The same position with the en-passant target dropped.
    pub(crate) fn without_en_passant(&self) -> Self {
        Self {
            en_passant: None,
            ..self.clone()
        }
    }

    pub fn get(&self, pos: BoardPos) -> Option<Piece> {
        if pos.is_valid() {
            return self[pos];
        }

        None
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Returns if white is the current player
    pub fn white_to_move(&self) -> bool {
        self.side_to_move.is_white()
    }

    pub fn castling(&self) -> &CastlingRights {
        &self.castling
    }

    /// The square a pawn may capture onto en passant, if the last move was a
    /// double push.
    pub fn en_passant(&self) -> Option<BoardPos> {
        self.en_passant
    }

    pub fn halfmoves(&self) -> u32 {
        self.halfmoves
    }

    pub fn fullmoves(&self) -> u32 {
        self.fullmoves
    }

    /// Occupied squares in board-scan order: a1, b1, ..., h1, a2, ..., h8.
    pub fn pieces(&self) -> impl Iterator<Item = (BoardPos, Piece)> + '_ {
        (0..8).flat_map(move |rank| {
            (0..8).filter_map(move |file| {
                let pos = BoardPos::new(file, rank);
                self[pos].map(|piece| (pos, piece))
            })
        })
    }

    pub fn find_first(&self, piece: Piece) -> Option<BoardPos> {
        self.pieces().find(|&(_, p)| p == piece).map(|(pos, _)| pos)
    }

    pub fn king_pos(&self, color: Color) -> Option<BoardPos> {
        self.find_first(Piece::new(color, PieceKind::King))
    }

    /// Ranks flipped and colours swapped. The side to move is kept, so a
    /// score taken from the side to move changes sign.
    pub fn mirrored(&self) -> Self {
        let mut board = Self {
            pieces: [[None; 8]; 8],
            castling: self.castling.mirrored(),
            en_passant: self.en_passant.map(|pos| pos.flip_vert()),
            ..self.clone()
        };

        for (pos, piece) in self.pieces() {
            board[pos.flip_vert()] = Some(piece.opposite());
        }

        board
    }

    /// Applies a pseudo-legal move. Legality is the caller's concern; the
    /// returned state is what `undo` needs to restore the board exactly.
    pub fn apply(&mut self, m: &Move) -> UndoState {
        let color = self.side_to_move;
        let piece = match self[m.from_pos] {
            Some(piece) => piece,
            None => panic!("No piece to move!\nBoard:\n{self}\nMove: {m}"),
        };

        let mut undo = UndoState {
            captured: None,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmoves: self.halfmoves,
            fullmoves: self.fullmoves,
        };

        undo.captured = if m.flags.en_passant {
            self[BoardPos::new(m.to_pos.file, m.from_pos.rank)].take()
        } else {
            self[m.to_pos].take()
        };

        assert!(
            !undo.captured.is_some_and(|p| p.kind == PieceKind::King),
            "King captured!\nBoard:\n{self}\nMove: {m}"
        );

        self[m.from_pos] = None;
        self[m.to_pos] = Some(m.promotion.map_or(piece, |kind| Piece::new(color, kind)));

        if m.flags.castling {
            let (rook_from, rook_to) = castle_rook_squares(m.to_pos);
            self[rook_to] = self[rook_from].take();
        }

        if piece.kind == PieceKind::King {
            self.castling.revoke(color, true, true);
        }
        self.castling.revoke_for_square(m.from_pos);
        self.castling.revoke_for_square(m.to_pos);

        self.en_passant = if m.flags.double_push {
            Some(BoardPos::new(
                m.from_pos.file,
                (m.from_pos.rank + m.to_pos.rank) / 2,
            ))
        } else {
            None
        };

        if piece.kind == PieceKind::Pawn || undo.captured.is_some() {
            self.halfmoves = 0;
        } else {
            self.halfmoves = self.halfmoves.saturating_add(1);
        }

        if color == Color::Black {
            self.fullmoves = self.fullmoves.saturating_add(1);
        }

        self.side_to_move = !color;

        trace!("applied {m}");

        undo
    }

    /// Exact inverse of `apply` for the same move.
    pub fn undo(&mut self, m: &Move, undo: UndoState) {
        self.side_to_move = !self.side_to_move;
        let color = self.side_to_move;

        let moved = self[m.to_pos].take();
        self[m.from_pos] = if m.promotion.is_some() {
            Some(Piece::new(color, PieceKind::Pawn))
        } else {
            moved
        };

        if m.flags.en_passant {
            self[BoardPos::new(m.to_pos.file, m.from_pos.rank)] = undo.captured;
        } else {
            self[m.to_pos] = undo.captured;
        }

        if m.flags.castling {
            let (rook_from, rook_to) = castle_rook_squares(m.to_pos);
            self[rook_from] = self[rook_to].take();
        }

        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmoves = undo.halfmoves;
        self.fullmoves = undo.fullmoves;
    }

    /// No side can ever deliver mate: bare kings, a single minor piece, or
    /// bishops that all stand on one square colour.
    pub fn has_insufficient_material(&self) -> bool {
        let mut knights = 0;
        // Indexed by square colour
        let mut bishops = [0; 2];

        for (pos, piece) in self.pieces() {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
                PieceKind::Knight => knights += 1,
                PieceKind::Bishop => bishops[pos.is_light() as usize] += 1,
            }
        }

        let minors = knights + bishops[0] + bishops[1];

        minors <= 1 || (knights == 0 && (bishops[0] == 0 || bishops[1] == 0))
    }
}

/// Rook origin and destination for a castling king landing on `king_to`.
fn castle_rook_squares(king_to: BoardPos) -> (BoardPos, BoardPos) {
    if king_to.file == 6 {
        (
            BoardPos::new(7, king_to.rank),
            BoardPos::new(5, king_to.rank),
        )
    } else {
        (
            BoardPos::new(0, king_to.rank),
            BoardPos::new(3, king_to.rank),
        )
    }
}

impl Index<BoardPos> for Board {
    type Output = Option<Piece>;

    fn index(&self, index: BoardPos) -> &Self::Output {
        &self.pieces[index.rank as usize][index.file as usize]
    }
}

impl IndexMut<BoardPos> for Board {
    fn index_mut(&mut self, index: BoardPos) -> &mut Self::Output {
        &mut self.pieces[index.rank as usize][index.file as usize]
    }
}

impl Default for Board {
    fn default() -> Self {
        let mut board = Self::empty();
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for color in [Color::White, Color::Black] {
            let pawn_rank = color.home_rank().wrapping_add_signed(color.pawn_direction());
            for (file, kind) in (0..).zip(back_rank) {
                board[BoardPos::new(file, color.home_rank())] = Some(Piece::new(color, kind));
                board[BoardPos::new(file, pawn_rank)] =
                    Some(Piece::new(color, PieceKind::Pawn));
            }
        }

        board.castling = CastlingRights::ALL;
        board
    }
}

pub(crate) fn char_to_file(c: char) -> Option<CoordTyp> {
    match c {
        'a'..='h' => Some(c as CoordTyp - b'a'),
        _ => None,
    }
}

pub(crate) fn char_to_rank(c: char) -> Option<CoordTyp> {
    match c {
        '1'..='8' => Some(c as CoordTyp - b'1'),
        _ => None,
    }
}

fn file_to_char(f: CoordTyp) -> char {
    (b'a' + f) as char
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct BoardPos {
    pub file: CoordTyp,
    pub rank: CoordTyp,
}

impl BoardPos {
    pub const fn new(file: CoordTyp, rank: CoordTyp) -> Self {
        Self { file, rank }
    }

    pub const fn flip_vert(&self) -> Self {
        Self {
            file: self.file,
            rank: 7 - self.rank,
        }
    }

    pub const fn is_valid(&self) -> bool {
        self.file < 8 && self.rank < 8
    }

    /// h1 is light, a1 is dark.
    pub const fn is_light(&self) -> bool {
        (self.file + self.rank) % 2 == 1
    }

    pub fn add_offset(&self, offset: (CoordOffsetTyp, CoordOffsetTyp)) -> Option<Self> {
        let p = Self {
            file: self.file.checked_add_signed(offset.0)?,
            rank: self.rank.checked_add_signed(offset.1)?,
        };

        if !p.is_valid() {
            return None;
        }

        Some(p)
    }
}

impl Display for BoardPos {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", file_to_char(self.file), self.rank + 1)
    }
}

impl FromStr for BoardPos {
    type Err = MalformedPositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(f), Some(r), None) => match (char_to_file(f), char_to_rank(r)) {
                (Some(file), Some(rank)) => Ok(Self::new(file, rank)),
                _ => Err(MalformedPositionError::Square(s.to_string())),
            },
            _ => Err(MalformedPositionError::Square(s.to_string())),
        }
    }
}

/// What kind of move this is, beyond its squares. Set by the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MoveFlags {
    pub capture: bool,
    pub en_passant: bool,
    pub castling: bool,
    pub double_push: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Move {
    pub from_pos: BoardPos,
    pub to_pos: BoardPos,
    pub promotion: Option<PieceKind>,
    pub flags: MoveFlags,
}

impl Move {
    pub fn new(from_pos: BoardPos, to_pos: BoardPos) -> Self {
        Self {
            from_pos,
            to_pos,
            ..Default::default()
        }
    }

    pub fn new_capture(from_pos: BoardPos, to_pos: BoardPos) -> Self {
        Self {
            flags: MoveFlags {
                capture: true,
                ..Default::default()
            },
            ..Self::new(from_pos, to_pos)
        }
    }

    pub fn new_promotion(
        from_pos: BoardPos,
        to_pos: BoardPos,
        promotion: PieceKind,
        capture: bool,
    ) -> Self {
        Self {
            promotion: Some(promotion),
            flags: MoveFlags {
                capture,
                ..Default::default()
            },
            ..Self::new(from_pos, to_pos)
        }
    }

    pub fn new_double_push(from_pos: BoardPos, to_pos: BoardPos) -> Self {
        Self {
            flags: MoveFlags {
                double_push: true,
                ..Default::default()
            },
            ..Self::new(from_pos, to_pos)
        }
    }

    pub fn new_en_passant(from_pos: BoardPos, to_pos: BoardPos) -> Self {
        Self {
            flags: MoveFlags {
                capture: true,
                en_passant: true,
                ..Default::default()
            },
            ..Self::new(from_pos, to_pos)
        }
    }

    pub fn new_castle(from_pos: BoardPos, to_pos: BoardPos) -> Self {
        Self {
            flags: MoveFlags {
                castling: true,
                ..Default::default()
            },
            ..Self::new(from_pos, to_pos)
        }
    }

    pub fn is_capture(&self) -> bool {
        self.flags.capture
    }

    /// Same squares and promotion, ignoring flags. Used to match moves read
    /// from text, which carry no flags, against generated ones.
    pub fn same_squares(&self, other: &Move) -> bool {
        self.from_pos == other.from_pos
            && self.to_pos == other.to_pos
            && self.promotion == other.promotion
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from_pos, self.to_pos)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.to_char())?;
        }

        Ok(())
    }
}

/// Parses coordinate notation (`e2e4`, `e7e8q`). The result has no flags;
/// resolve it against the legal moves before applying.
impl FromStr for Move {
    type Err = IllegalMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unparseable = || IllegalMoveError::Unparseable(s.to_string());

        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(unparseable());
        }

        let from_pos = BoardPos::from_str(&s[0..2]).map_err(|_| unparseable())?;
        let to_pos = BoardPos::from_str(&s[2..4]).map_err(|_| unparseable())?;

        let promotion = match s[4..].chars().next() {
            Some(c) => match PieceKind::from_char(c) {
                Some(kind) if PieceKind::PROMOTIONS.contains(&kind) => Some(kind),
                _ => return Err(unparseable()),
            },
            None => None,
        };

        Ok(Move {
            from_pos,
            to_pos,
            promotion,
            flags: MoveFlags::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn default_board_matches_start_position() {
        let board = Board::default();
        assert_eq!(board.to_fen(), Board::DEFAULT_FEN);
        assert_eq!(board.king_pos(Color::White), Some(BoardPos::new(4, 0)));
        assert_eq!(board.king_pos(Color::Black), Some(BoardPos::new(4, 7)));
    }

    #[test]
    fn board_pos_text() {
        assert_eq!(BoardPos::from_str("e4").unwrap(), BoardPos::new(4, 3));
        assert_eq!(BoardPos::new(0, 7).to_string(), "a8");
        assert!(BoardPos::from_str("i1").is_err());
        assert!(BoardPos::from_str("a9").is_err());
        assert!(BoardPos::from_str("a10").is_err());
    }

    #[test]
    fn square_colours() {
        assert!(!BoardPos::from_str("a1").unwrap().is_light());
        assert!(BoardPos::from_str("h1").unwrap().is_light());
        assert!(BoardPos::from_str("d1").unwrap().is_light());
    }

    #[test]
    fn move_text() {
        let m = Move::from_str("e7e8q").unwrap();
        assert_eq!(m.promotion, Some(PieceKind::Queen));
        assert_eq!(m.to_string(), "e7e8q");
        assert!(Move::from_str("e7e8k").is_err());
        assert!(Move::from_str("e7").is_err());
        assert!(Move::from_str("e2e4e").is_err());
    }

    #[test]
    fn castling_rights_text() {
        assert_eq!(CastlingRights::ALL.to_fen(), "KQkq");
        assert_eq!(CastlingRights::NONE.to_fen(), "-");

        let mut rights = CastlingRights::ALL;
        rights.revoke(Color::White, true, true);
        rights.revoke(Color::Black, false, true);
        assert_eq!(rights.to_fen(), "q");
    }

    #[test]
    fn rook_capture_revokes_right() {
        let mut board =
            Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let m = Move::new_capture(BoardPos::new(0, 0), BoardPos::new(0, 7));
        board.apply(&m);
        assert_eq!(board.castling().to_fen(), "Kk");
    }

    #[test]
    fn mirrored_board() {
        let board = Board::from_fen(
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w Kq e6 0 2",
        )
        .unwrap();
        let mirrored = board.mirrored();

        assert_eq!(
            mirrored[BoardPos::new(4, 7)],
            Some(Piece::new(Color::Black, PieceKind::King))
        );
        assert_eq!(mirrored.castling().to_fen(), "Qk");
        assert_eq!(mirrored.en_passant(), Some(BoardPos::new(4, 2)));
        assert_eq!(mirrored.side_to_move(), Color::White);
        assert_eq!(mirrored.mirrored(), board);
    }

    #[test]
    fn insufficient_material() {
        let cases = [
            ("8/8/4k3/8/8/4K3/8/8 w - - 0 1", true),
            ("8/8/4k3/8/8/4KN2/8/8 w - - 0 1", true),
            ("8/8/4kb2/8/8/4KB2/8/8 w - - 0 1", false),
            ("8/8/4k1b1/8/8/4KB2/8/8 w - - 0 1", true),
            ("8/8/4k3/8/8/4KNN1/8/8 w - - 0 1", false),
            ("8/8/4k3/8/8/4K3/4P3/8 w - - 0 1", false),
        ];

        for (fen, expected) in cases {
            let board = Board::from_fen(fen).unwrap();
            assert_eq!(board.has_insufficient_material(), expected, "{fen}");
        }
    }
}
