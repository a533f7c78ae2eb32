//! FEN parsing and serialization.
//!
//! The full-move counter is read but not stored; `his_ply` restarts at zero
//! whenever a position is set, so repetition scans never cross a `position`
//! command.

use super::{Board, Color, Piece, EMPTY};
use crate::hash::zobrist;
use crate::square::{parse_square, square, square_name, NO_SQ};

fn piece_from_char(c: char) -> Result<(Color, u8), String> {
    let color = if c.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let piece = match c.to_ascii_lowercase() {
        'p' => Piece::Pawn,
        'n' => Piece::Knight,
        'b' => Piece::Bishop,
        'r' => Piece::Rook,
        'q' => Piece::Queen,
        'k' => Piece::King,
        _ => return Err(format!("invalid piece character '{c}'")),
    };
    Ok((color, piece as u8))
}

fn piece_char(piece: u8, color: Color) -> char {
    let c = match Piece::from_index(piece) {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    if color == Color::White {
        c.to_ascii_uppercase()
    } else {
        c
    }
}

impl Board {
    pub fn from_fen(fen: &str) -> Result<Board, String> {
        let mut board = Board::empty();

        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or("empty FEN")?;
        let side = fields.next().ok_or("FEN missing side to move")?;
        let castling = fields.next().unwrap_or("-");
        let ep = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        // Full-move number parsed for shape only.
        let _fullmove = fields.next().unwrap_or("1");

        // Piece placement, rank 8 down to rank 1.
        let mut rank = 7u8;
        let mut file = 0u8;
        for c in placement.chars() {
            match c {
                '/' => {
                    if file != 8 || rank == 0 {
                        return Err("malformed FEN rank".to_string());
                    }
                    rank -= 1;
                    file = 0;
                }
                '1'..='8' => {
                    file += c as u8 - b'0';
                    if file > 8 {
                        return Err("FEN rank overflows".to_string());
                    }
                }
                _ => {
                    if file > 7 {
                        return Err("FEN rank overflows".to_string());
                    }
                    let (color, piece) = piece_from_char(c)?;
                    board.set_piece(color, piece, square(file, rank));
                    file += 1;
                }
            }
        }
        if rank != 0 || file != 8 {
            return Err("FEN placement does not cover the board".to_string());
        }

        board.side = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(format!("invalid side to move '{side}'")),
        };

        board.castle_perm = 0;
        if castling != "-" {
            for c in castling.chars() {
                board.castle_perm |= match c {
                    'K' => super::CASTLE_WK,
                    'Q' => super::CASTLE_WQ,
                    'k' => super::CASTLE_BK,
                    'q' => super::CASTLE_BQ,
                    _ => return Err(format!("invalid castling character '{c}'")),
                };
            }
        }

        board.ep_square = if ep == "-" {
            NO_SQ
        } else {
            parse_square(ep).ok_or_else(|| format!("invalid en passant square '{ep}'"))?
        };

        board.fifty_move = halfmove
            .parse()
            .map_err(|_| format!("invalid halfmove clock '{halfmove}'"))?;

        board.history.clear();
        board.hash = zobrist::compute(&board);
        board.validate()?;
        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(90);

        for rank in (0..8u8).rev() {
            let mut empty_run = 0;
            for file in 0..8u8 {
                let sq = square(file, rank);
                let piece = self.squares[sq as usize];
                if piece == EMPTY {
                    empty_run += 1;
                    continue;
                }
                if empty_run > 0 {
                    fen.push((b'0' + empty_run) as char);
                    empty_run = 0;
                }
                let color = if crate::bitboard::test_bit(self.colors[Color::White as usize], sq) {
                    Color::White
                } else {
                    Color::Black
                };
                fen.push(piece_char(piece, color));
            }
            if empty_run > 0 {
                fen.push((b'0' + empty_run) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.side == Color::White { 'w' } else { 'b' });

        fen.push(' ');
        if self.castle_perm == 0 {
            fen.push('-');
        } else {
            if self.castle_perm & super::CASTLE_WK != 0 {
                fen.push('K');
            }
            if self.castle_perm & super::CASTLE_WQ != 0 {
                fen.push('Q');
            }
            if self.castle_perm & super::CASTLE_BK != 0 {
                fen.push('k');
            }
            if self.castle_perm & super::CASTLE_BQ != 0 {
                fen.push('q');
            }
        }

        fen.push(' ');
        if self.ep_square == NO_SQ {
            fen.push('-');
        } else {
            fen.push_str(&square_name(self.ep_square));
        }

        let fullmove = self.his_ply() / 2 + 1;
        fen.push_str(&format!(" {} {}", self.fifty_move, fullmove));
        fen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::START_FEN;

    #[test]
    fn start_position_shape() {
        let board = Board::start();
        assert_eq!(board.side, Color::White);
        assert_eq!(board.castle_perm, 0xF);
        assert_eq!(board.ep_square, NO_SQ);
        assert_eq!(board.fifty_move, 0);
        assert_eq!(crate::bitboard::popcount(board.occupied()), 32);
        assert_eq!(board.to_fen(), START_FEN);
    }

    #[test]
    fn round_trip_is_stable() {
        let fens = [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2",
        ];
        for fen in fens {
            let a = Board::from_fen(fen).unwrap();
            let b = Board::from_fen(&a.to_fen()).unwrap();
            assert_eq!(a, b, "round trip changed the position for {fen}");
        }
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Board::from_fen("").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1").is_err());
        assert!(Board::from_fen("rnbqkbnr/ppxppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KZkq - 0 1").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq z9 0 1").is_err());
    }

    #[test]
    fn hash_matches_recompute_after_parse() {
        let board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        assert_eq!(board.hash, zobrist::compute(&board));
    }
}
