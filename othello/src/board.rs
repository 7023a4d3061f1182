//! Board representation, move legality and piece flipping
//!
//! Cells are addressed as `(col, row)` and stored row-major, so the flat
//! index of a cell is `row * 8 + col`. The board does not track whose turn
//! it is; every query takes the player explicitly (see [`crate::state`]).

use std::fmt;
use std::str::FromStr;

use crate::{Cell, GameError, Player};

pub const BOARD_SIZE: usize = 8;
pub const NUM_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// Compass rays as `(dcol, drow)`
const DIRECTIONS: [(i8, i8); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// A cell on the board, always in range
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Move {
    col: u8,
    row: u8,
}

impl Move {
    /// `None` when either coordinate is off the board
    pub fn new(col: usize, row: usize) -> Option<Self> {
        if col >= BOARD_SIZE || row >= BOARD_SIZE {
            return None;
        }
        Some(Move {
            col: col as u8,
            row: row as u8,
        })
    }

    /// Build a move from a flat action index (`row * 8 + col`)
    pub fn from_index(index: i64) -> Result<Self, GameError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < NUM_CELLS)
            .and_then(|i| Move::new(i % BOARD_SIZE, i / BOARD_SIZE))
            .ok_or(GameError::OutOfRange { index })
    }

    pub fn col(&self) -> usize {
        self.col as usize
    }

    pub fn row(&self) -> usize {
        self.row as usize
    }

    pub fn index(&self) -> usize {
        self.row() * BOARD_SIZE + self.col()
    }

    pub fn is_corner(&self) -> bool {
        let edge = (BOARD_SIZE - 1) as u8;
        (self.col == 0 || self.col == edge) && (self.row == 0 || self.row == edge)
    }

    /// Every cell in row-major order
    pub fn all() -> impl Iterator<Item = Move> {
        (0..BOARD_SIZE as u8)
            .flat_map(|row| (0..BOARD_SIZE as u8).map(move |col| Move { col, row }))
    }

    fn step(&self, (dc, dr): (i8, i8)) -> Option<Move> {
        let col = self.col as i8 + dc;
        let row = self.row as i8 + dr;
        let range = 0..BOARD_SIZE as i8;
        if range.contains(&col) && range.contains(&row) {
            Some(Move {
                col: col as u8,
                row: row as u8,
            })
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Create a board in the standard opening position
    pub fn new() -> Self {
        let mut board = Board {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        };
        board.initialize();
        board
    }

    /// Build a board from an arbitrary grid, indexed `cells[row][col]`
    pub fn from_cells(cells: [[Cell; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Board { cells }
    }

    /// Reset the grid to the opening position:
    /// - (3,3) and (4,4) are Black
    /// - (3,4) and (4,3) are White
    pub fn initialize(&mut self) {
        self.cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
        self.cells[3][3] = Cell::Black;
        self.cells[4][4] = Cell::Black;
        self.cells[3][4] = Cell::White;
        self.cells[4][3] = Cell::White;
    }

    /// Copy of the grid, indexed `[row][col]`
    pub fn get_board(&self) -> [[Cell; BOARD_SIZE]; BOARD_SIZE] {
        self.cells
    }

    pub fn cell(&self, mv: Move) -> Cell {
        self.cells[mv.row()][mv.col()]
    }

    fn set(&mut self, mv: Move, cell: Cell) {
        self.cells[mv.row()][mv.col()] = cell;
    }

    /// Number of cells occupied by `player`
    pub fn count(&self, player: Player) -> usize {
        let target = player.to_cell();
        self.cells.iter().flatten().filter(|&&cell| cell == target).count()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&cell| cell == Cell::Empty).count()
    }

    /// Check whether `player` may place a piece at (col, row).
    /// Off-board coordinates are never legal.
    pub fn is_valid_move(&self, col: usize, row: usize, player: Player) -> bool {
        match Move::new(col, row) {
            Some(mv) => self.is_legal(mv, player),
            None => false,
        }
    }

    fn is_legal(&self, mv: Move, player: Player) -> bool {
        self.cell(mv) == Cell::Empty
            && DIRECTIONS
                .iter()
                .any(|&dir| self.capture_run(mv, dir, player).is_some())
    }

    /// Legal placements for `player`, in row-major order
    pub fn valid_moves(&self, player: Player) -> Vec<Move> {
        Move::all().filter(|&mv| self.is_legal(mv, player)).collect()
    }

    pub fn has_valid_move(&self, player: Player) -> bool {
        Move::all().any(|mv| self.is_legal(mv, player))
    }

    /// 0/1 mask of legal cells for `player`, indexed `[row][col]`
    pub fn action_mask(&self, player: Player) -> [[u8; BOARD_SIZE]; BOARD_SIZE] {
        let mut mask = [[0u8; BOARD_SIZE]; BOARD_SIZE];
        for mv in self.valid_moves(player) {
            mask[mv.row()][mv.col()] = 1;
        }
        mask
    }

    /// Place a piece for `player` and flip every captured run.
    ///
    /// Returns the flipped cells, or `None` without touching the board when
    /// the move is not legal.
    pub fn place(&mut self, col: usize, row: usize, player: Player) -> Option<Vec<Move>> {
        let mv = Move::new(col, row)?;
        if self.cell(mv) != Cell::Empty {
            return None;
        }

        let flips: Vec<Move> = DIRECTIONS
            .iter()
            .filter_map(|&dir| self.capture_run(mv, dir, player))
            .flatten()
            .collect();
        if flips.is_empty() {
            return None;
        }

        let own = player.to_cell();
        self.set(mv, own);
        for &flip in &flips {
            self.set(flip, own);
        }

        Some(flips)
    }

    /// Walk one ray from `origin` and collect the opponent run it captures.
    ///
    /// The run must be non-empty and closed by one of `player`'s pieces. An
    /// empty cell or the board edge before that point means no capture.
    fn capture_run(&self, origin: Move, dir: (i8, i8), player: Player) -> Option<Vec<Move>> {
        let own = player.to_cell();
        let mut run = Vec::new();
        let mut cursor = origin.step(dir);

        while let Some(here) = cursor {
            match self.cell(here) {
                Cell::Empty => return None,
                cell if cell == own => return if run.is_empty() { None } else { Some(run) },
                _ => run.push(here),
            }
            cursor = here.step(dir);
        }

        None
    }

    /// Neither color has a legal move. Always recomputed.
    pub fn is_game_over(&self) -> bool {
        !self.has_valid_move(Player::White) && !self.has_valid_move(Player::Black)
    }

    /// Flat cell codes (0 = empty, 1 = white, 2 = black), indexed `row * 8 + col`
    pub fn to_state(&self) -> [u8; NUM_CELLS] {
        let mut state = [0u8; NUM_CELLS];
        for mv in Move::all() {
            state[mv.index()] = self.cell(mv).code();
        }
        state
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: Vec<&str> = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => ".",
                    Cell::White => "W",
                    Cell::Black => "B",
                })
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

/// Parses the [`Display`](fmt::Display) form: `.`, `W` and `B`, whitespace ignored.
impl FromStr for Board {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
        let mut index = 0;

        for ch in s.chars().filter(|c| !c.is_whitespace()) {
            let cell = match ch {
                '.' => Cell::Empty,
                'W' => Cell::White,
                'B' => Cell::Black,
                other => {
                    return Err(GameError::ParseBoard(format!(
                        "unexpected character {other:?}"
                    )))
                }
            };
            if index >= NUM_CELLS {
                return Err(GameError::ParseBoard(format!("more than {NUM_CELLS} cells")));
            }
            cells[index / BOARD_SIZE][index % BOARD_SIZE] = cell;
            index += 1;
        }

        if index != NUM_CELLS {
            return Err(GameError::ParseBoard(format!(
                "expected {NUM_CELLS} cells, got {index}"
            )));
        }

        Ok(Board { cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(col: usize, row: usize) -> Move {
        Move::new(col, row).unwrap()
    }

    fn parse(rows: &str) -> Board {
        rows.parse().unwrap()
    }

    #[test]
    fn test_board_new_initial_setup() {
        let board = Board::new();

        assert_eq!(board.cell(mv(3, 3)), Cell::Black);
        assert_eq!(board.cell(mv(4, 4)), Cell::Black);
        assert_eq!(board.cell(mv(4, 3)), Cell::White);
        assert_eq!(board.cell(mv(3, 4)), Cell::White);

        assert_eq!(board.count(Player::White), 2);
        assert_eq!(board.count(Player::Black), 2);
        assert_eq!(board.empty_count(), 60);
    }

    #[test]
    fn test_initialize_resets_in_place() {
        let mut board = Board::new();
        board.place(2, 3, Player::White).unwrap();
        assert_ne!(board, Board::new());

        board.initialize();
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_move_index_conversion() {
        let m = Move::from_index(26).unwrap();
        assert_eq!((m.col(), m.row()), (2, 3));
        assert_eq!(m.index(), 26);
        assert_eq!(Move::from_index(64), Err(GameError::OutOfRange { index: 64 }));
        assert_eq!(Move::from_index(-1), Err(GameError::OutOfRange { index: -1 }));
        assert_eq!(
            Move::from_index(i64::MAX),
            Err(GameError::OutOfRange { index: i64::MAX })
        );
        assert_eq!(Move::new(8, 0), None);
    }

    #[test]
    fn test_corners() {
        let corners: Vec<usize> = Move::all().filter(Move::is_corner).map(|m| m.index()).collect();
        assert_eq!(corners, vec![0, 7, 56, 63]);
    }

    #[test]
    fn test_valid_moves_initial_board() {
        let board = Board::new();

        assert_eq!(
            board.valid_moves(Player::White),
            vec![mv(3, 2), mv(2, 3), mv(5, 4), mv(4, 5)]
        );
        assert_eq!(
            board.valid_moves(Player::Black),
            vec![mv(4, 2), mv(5, 3), mv(2, 4), mv(3, 5)]
        );
    }

    #[test]
    fn test_is_valid_move_initial_board() {
        let board = Board::new();

        assert!(board.is_valid_move(2, 3, Player::White));
        assert!(!board.is_valid_move(2, 3, Player::Black));

        // Occupied
        assert!(!board.is_valid_move(3, 3, Player::White));
        // Empty but nothing to capture
        assert!(!board.is_valid_move(0, 0, Player::White));
        assert!(!board.is_valid_move(7, 7, Player::Black));
    }

    #[test]
    fn test_is_valid_move_out_of_bounds() {
        let board = Board::new();
        assert!(!board.is_valid_move(8, 0, Player::White));
        assert!(!board.is_valid_move(0, 8, Player::White));
        assert!(!board.is_valid_move(10, 10, Player::Black));
    }

    #[test]
    fn test_place_opening_move() {
        let mut board = Board::new();

        let flipped = board.place(2, 3, Player::White).unwrap();

        assert_eq!(flipped, vec![mv(3, 3)]);
        assert_eq!(board.cell(mv(2, 3)), Cell::White);
        assert_eq!(board.cell(mv(3, 3)), Cell::White);
        assert_eq!(board.count(Player::White), 4);
        assert_eq!(board.count(Player::Black), 1);
    }

    #[test]
    fn test_place_invalid_leaves_board_unchanged() {
        let mut board = Board::new();
        let before = board;

        assert_eq!(board.place(0, 0, Player::White), None);
        assert_eq!(board.place(3, 3, Player::White), None);
        assert_eq!(board.place(9, 1, Player::White), None);
        assert_eq!(board, before);
    }

    #[test]
    fn test_place_flips_multiple_directions() {
        let mut board = parse(
            "W . W . . . . .
             . B B . . . . .
             W B . B W . . .
             . . B . . . . .
             . . W . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .",
        );

        let mut flipped = board.place(2, 2, Player::White).unwrap();
        flipped.sort_by_key(Move::index);

        // Every ray with a black neighbour is closed by a white piece
        assert_eq!(
            flipped,
            vec![mv(1, 1), mv(2, 1), mv(1, 2), mv(3, 2), mv(2, 3)]
        );
        assert_eq!(board.count(Player::Black), 0);
        assert_eq!(board.count(Player::White), 11);
    }

    #[test]
    fn test_flips_never_cross_empty_cell() {
        // East ray: B, gap, W. South ray: B, B, W
        let mut board = parse(
            ". B . W . . . .
             B . . . . . . .
             B . . . . . . .
             W . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .",
        );

        let flipped = board.place(0, 0, Player::White).unwrap();

        assert_eq!(flipped, vec![mv(0, 1), mv(0, 2)]);
        assert_eq!(board.cell(mv(1, 0)), Cell::Black);
        assert_eq!(board.cell(mv(2, 0)), Cell::Empty);
        assert_eq!(board.cell(mv(3, 0)), Cell::White);
    }

    #[test]
    fn test_run_reaching_edge_is_not_a_capture() {
        let board = parse(
            ". . . . . B B B
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . W",
        );

        assert!(!board.is_valid_move(4, 0, Player::White));
        assert!(board.valid_moves(Player::White).is_empty());
    }

    #[test]
    fn test_is_game_over() {
        assert!(!Board::new().is_game_over());

        let mut cells = [[Cell::White; BOARD_SIZE]; BOARD_SIZE];
        cells[0][0] = Cell::Black;
        let full = Board::from_cells(cells);
        assert_eq!(full.empty_count(), 0);
        assert!(full.is_game_over());

        // Single color with empty cells left
        let lone = parse(
            "W W . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .
             . . . . . . . .",
        );
        assert!(lone.is_game_over());
    }

    #[test]
    fn test_action_mask_matches_valid_moves() {
        let board = Board::new();
        let mask = board.action_mask(Player::White);

        assert_eq!(mask.iter().flatten().filter(|&&v| v == 1).count(), 4);
        assert_eq!(mask[3][2], 1);
        assert_eq!(mask[2][3], 1);
        assert_eq!(mask[0][0], 0);
    }

    #[test]
    fn test_to_state() {
        let state = Board::new().to_state();

        assert_eq!(state[3 * 8 + 3], 2);
        assert_eq!(state[3 * 8 + 4], 1);
        assert_eq!(state[4 * 8 + 3], 1);
        assert_eq!(state[4 * 8 + 4], 2);
        assert_eq!(state.iter().filter(|&&c| c == 0).count(), 60);
    }

    #[test]
    fn test_display_and_parse_agree() {
        let board = Board::new();
        let text = board.to_string();

        assert_eq!(text.lines().nth(3), Some(". . . B W . . ."));
        assert_eq!(text.parse::<Board>().unwrap(), board);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!("X".parse::<Board>(), Err(GameError::ParseBoard(_))));
        assert!(matches!(". . .".parse::<Board>(), Err(GameError::ParseBoard(_))));
        let too_long = ".".repeat(65);
        assert!(matches!(too_long.parse::<Board>(), Err(GameError::ParseBoard(_))));
    }
}
