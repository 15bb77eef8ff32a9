//! This module implements the static geometry of a puzzle: which cells can hold letters, the slots
//! those cells form, and where slots cross each other. Nothing here changes during a fill.

use std::collections::HashMap;
use std::fs;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

use crate::word_list::WordList;
use crate::CHECK_INVARIANTS;

pub use crate::types::SlotId;
use crate::types::WordId;

/// Zero-indexed x and y coords for a cell in the grid, where y = 0 in the top row.
pub type GridCoord = (usize, usize);

/// A pair of cell indices `(i, j)` such that cell `i` of one slot is the same grid cell as cell `j`
/// of the other.
pub type Overlap = (usize, usize);

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("Can’t read file: “{0}”")]
    InvalidPath(String),

    #[error("Grid must have at least one row")]
    Empty,
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,

    /// For each cell of the slot, the slot crossing it there (if any).
    pub crossings: Vec<Option<Crossing>>,
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        self.slot_spec().cell_coords()
    }

    /// Generate a `SlotSpec` identifying this slot.
    #[must_use]
    pub fn slot_spec(&self) -> SlotSpec {
        SlotSpec {
            start_cell: self.start_cell,
            direction: self.direction,
            length: self.length,
        }
    }

    /// Generate a string key identifying this slot.
    #[must_use]
    pub fn slot_key(&self) -> String {
        self.slot_spec().to_key()
    }
}

/// A struct identifying a specific slot in the grid. Two specs are the same slot exactly when all
/// three fields match.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct SlotSpec {
    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl SlotSpec {
    /// Represent this slot as a string like "1,2,down,5".
    #[must_use]
    pub fn to_key(&self) -> String {
        let direction = match self.direction {
            Direction::Across => "across",
            Direction::Down => "down",
        };
        format!(
            "{},{},{},{}",
            self.start_cell.0, self.start_cell.1, direction, self.length,
        )
    }

    /// Generate the coords for each cell of this entry.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length)
            .map(|cell_idx| match self.direction {
                Direction::Across => (self.start_cell.0 + cell_idx, self.start_cell.1),
                Direction::Down => (self.start_cell.0, self.start_cell.1 + cell_idx),
            })
            .collect()
    }
}

/// A struct holding the complete geometry of a puzzle.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// The width and height of the grid.
    pub width: usize,
    pub height: usize,

    /// A flat array with one entry per cell, in order of row and then column; `true` means the
    /// cell can hold a letter.
    pub structure: Vec<bool>,

    /// Config representing all of the slots in the grid and their crossings. The order of this
    /// list is the order in which slots are enumerated during search.
    pub slot_configs: Vec<SlotConfig>,

    /// For each slot, the ids of the slots crossing it, ascending.
    neighbors: Vec<Vec<SlotId>>,
}

impl GridConfig {
    /// Build a config from rows of fillable-cell flags. Short rows are padded with blocks.
    pub fn new(structure: Vec<Vec<bool>>) -> Result<GridConfig, GridError> {
        if structure.is_empty() {
            return Err(GridError::Empty);
        }

        let structure = pad_rows(structure);
        let height = structure.len();
        let width = structure[0].len();
        let slot_configs = generate_slot_configs(&generate_slots_from_structure(&structure));

        let neighbors: Vec<Vec<SlotId>> = slot_configs
            .iter()
            .map(|slot_config| {
                let mut slot_ids: Vec<SlotId> = slot_config
                    .crossings
                    .iter()
                    .flatten()
                    .map(|crossing| crossing.other_slot_id)
                    .collect();
                slot_ids.sort_unstable();
                slot_ids.dedup();
                slot_ids
            })
            .collect();

        let config = GridConfig {
            width,
            height,
            structure: structure.into_iter().flatten().collect(),
            slot_configs,
            neighbors,
        };

        if CHECK_INVARIANTS {
            for x in config.slot_ids() {
                for y in config.slot_ids() {
                    let swapped = config.overlap(y, x).map(|(j, i)| (i, j));
                    assert_eq!(config.overlap(x, y), swapped, "Asymmetric overlap?");
                }
            }
        }

        Ok(config)
    }

    /// Read a structure file from disk and build a config from it.
    pub fn from_structure_file(path: &Path) -> Result<GridConfig, GridError> {
        let template = fs::read_to_string(path)
            .map_err(|_| GridError::InvalidPath(path.to_string_lossy().into()))?;
        generate_grid_config_from_template_string(&template)
    }

    /// Ids of every slot, in enumeration order.
    #[must_use]
    pub fn slot_ids(&self) -> Range<SlotId> {
        0..self.slot_configs.len()
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    /// The cell indices at which `x` and `y` must agree, or `None` if they don't share a cell. A
    /// slot never overlaps itself.
    #[must_use]
    pub fn overlap(&self, x: SlotId, y: SlotId) -> Option<Overlap> {
        if x == y {
            return None;
        }

        self.slot_configs[x]
            .crossings
            .iter()
            .enumerate()
            .find_map(|(cell_idx, crossing)| match crossing {
                Some(crossing) if crossing.other_slot_id == y => {
                    Some((cell_idx, crossing.other_slot_cell))
                }
                _ => None,
            })
    }

    /// The slots sharing at least one cell with the given slot.
    #[must_use]
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.neighbors[slot_id]
    }

    /// Can the given cell hold a letter? Coords outside the grid can't.
    #[must_use]
    pub fn is_fillable(&self, (x, y): GridCoord) -> bool {
        x < self.width && y < self.height && self.structure[y * self.width + x]
    }
}

/// Given `SlotSpec`s specifying the positions of the slots in a grid, generate `SlotConfig`s
/// containing derived information about crossings.
#[must_use]
pub fn generate_slot_configs(entries: &[SlotSpec]) -> Vec<SlotConfig> {
    // Build a map from cell location to entries involved, which we can then use to calculate
    // crossings. Each value is a list of (entry index, cell index within entry).
    let mut entries_by_loc: HashMap<GridCoord, Vec<(usize, usize)>> = HashMap::new();

    for (entry_idx, entry) in entries.iter().enumerate() {
        for (cell_idx, loc) in entry.cell_coords().into_iter().enumerate() {
            entries_by_loc
                .entry(loc)
                .or_default()
                .push((entry_idx, cell_idx));
        }
    }

    entries
        .iter()
        .enumerate()
        .map(|(entry_idx, entry)| {
            let crossings = entry
                .cell_coords()
                .into_iter()
                .map(|loc| {
                    let mut others = entries_by_loc[&loc]
                        .iter()
                        .filter(|&&(e, _)| e != entry_idx);
                    let crossing = others.next().map(|&(other_slot_id, other_slot_cell)| {
                        Crossing {
                            other_slot_id,
                            other_slot_cell,
                        }
                    });

                    if CHECK_INVARIANTS {
                        assert!(others.next().is_none(), "More than two slots at {loc:?}?");
                    }

                    crossing
                })
                .collect();

            SlotConfig {
                id: entry_idx,
                start_cell: entry.start_cell,
                direction: entry.direction,
                length: entry.length,
                crossings,
            }
        })
        .collect()
}

/// Parse a structure template into rows of fillable-cell flags. `_` and `.` are fillable, anything
/// else is a block. Lines are trimmed and blank lines skipped; short rows are padded with blocks.
pub fn parse_structure(template: &str) -> Result<Vec<Vec<bool>>, GridError> {
    let rows: Vec<Vec<bool>> = template
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                None
            } else {
                Some(line.chars().map(|c| c == '_' || c == '.').collect())
            }
        })
        .collect();

    if rows.is_empty() {
        return Err(GridError::Empty);
    }

    Ok(pad_rows(rows))
}

fn pad_rows(rows: Vec<Vec<bool>>) -> Vec<Vec<bool>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);

    rows.into_iter()
        .map(|mut row| {
            row.resize(width, false);
            row
        })
        .collect()
}

/// Generate a list of `SlotSpec`s from rows of fillable-cell flags: every maximal run of two or
/// more fillable cells is a slot. Across slots come first (row by row), then down slots (column by
/// column).
#[must_use]
pub fn generate_slots_from_structure(structure: &[Vec<bool>]) -> Vec<SlotSpec> {
    fn build_words(rows: &[Vec<bool>]) -> Vec<Vec<GridCoord>> {
        let mut result: Vec<Vec<GridCoord>> = vec![];

        for (y, line) in rows.iter().enumerate() {
            let mut current_word_coords: Vec<GridCoord> = vec![];

            for (x, &fillable) in line.iter().enumerate() {
                if fillable {
                    current_word_coords.push((x, y));
                } else {
                    if current_word_coords.len() > 1 {
                        result.push(current_word_coords);
                    }
                    current_word_coords = vec![];
                }
            }

            if current_word_coords.len() > 1 {
                result.push(current_word_coords);
            }
        }

        result
    }

    let mut slot_specs: Vec<SlotSpec> = vec![];

    for coords in build_words(structure) {
        slot_specs.push(SlotSpec {
            start_cell: coords[0],
            length: coords.len(),
            direction: Direction::Across,
        });
    }

    let width = structure.first().map_or(0, Vec::len);
    let transposed_structure: Vec<Vec<bool>> = (0..width)
        .map(|x| (0..structure.len()).map(|y| structure[y][x]).collect())
        .collect();

    for coords in build_words(&transposed_structure) {
        let coords: Vec<GridCoord> = coords.iter().copied().map(|(y, x)| (x, y)).collect();
        slot_specs.push(SlotSpec {
            start_cell: coords[0],
            length: coords.len(),
            direction: Direction::Down,
        });
    }

    slot_specs
}

/// Generate a `GridConfig` from a template string with `_` (or `.`) representing fillable cells
/// and `#` representing blocks.
pub fn generate_grid_config_from_template_string(template: &str) -> Result<GridConfig, GridError> {
    GridConfig::new(parse_structure(template)?)
}

/// A struct recording a slot assignment made during a fill process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// Lay the given choices out on the grid. Blocks and unfilled cells are `None`.
#[must_use]
pub fn letter_grid(
    config: &GridConfig,
    word_list: &WordList,
    choices: &[Choice],
) -> Vec<Vec<Option<char>>> {
    let mut grid: Vec<Vec<Option<char>>> = vec![vec![None; config.width]; config.height];

    for &Choice { slot_id, word_id } in choices {
        let word = &word_list.words[word_id];

        for ((x, y), &glyph) in config.slot_configs[slot_id]
            .cell_coords()
            .into_iter()
            .zip(&word.glyphs)
        {
            grid[y][x] = Some(word_list.glyphs[glyph]);
        }
    }

    grid
}

/// Turn the given grid config and fill choices into a rendered string, with `█` for blocks and a
/// space for fillable cells that have no letter.
#[must_use]
pub fn render_grid(config: &GridConfig, word_list: &WordList, choices: &[Choice]) -> String {
    letter_grid(config, word_list, choices)
        .iter()
        .enumerate()
        .map(|(y, line)| {
            line.iter()
                .enumerate()
                .map(|(x, cell)| {
                    if config.is_fillable((x, y)) {
                        cell.unwrap_or(' ')
                    } else {
                        '█'
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
