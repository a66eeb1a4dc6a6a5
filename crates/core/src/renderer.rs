use std::fmt::{Display, Formatter};

use crate::game::{Board, BoardPos, Color};

const BORDER: &str = "  +-----------------+";
const FILE_LABELS: &str = "    a b c d e f g h";

impl Board {
    /// One diagram row, rank number first. Empty squares are dots.
    fn render_rank(&self, rank: u8) -> String {
        let squares = (0..8)
            .map(|file| {
                self[BoardPos::new(file, rank)].map_or('.', |piece| piece.to_char())
            })
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ");

        format!("{} | {squares} |", rank + 1)
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{BORDER}")?;
        for rank in (0..8).rev() {
            writeln!(f, "{}", self.render_rank(rank))?;
        }
        writeln!(f, "{BORDER}")?;
        writeln!(f, "{FILE_LABELS}")?;

        let side = match self.side_to_move() {
            Color::White => "White",
            Color::Black => "Black",
        };
        writeln!(f, "{side} to move")?;
        writeln!(f, "FEN: {}", self.to_fen())
    }
}
