use std::collections::HashSet;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::scoring::de::WordList;
use crate::scoring::{ExerciseKind, ExerciseScorer, ItemFeedback, ScoreReport, ScoringError, ScoringResult};

const MIN_GRID_SIZE: usize = 15;
const PLACEMENT_TRIES: usize = 100;
const GRID_TRIES: usize = 3;
const FILL_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// (dx, dy): horizontal, vertical, diagonal down-right, diagonal up-right.
const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordSearchContent {
    pub words: Vec<String>,
    /// Rows of the generated grid.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grid: Vec<String>,
}

impl ExerciseScorer for WordSearchContent {
    type Answers = WordList;
    const KIND: ExerciseKind = ExerciseKind::WordSearch;

    fn canonicalize(&mut self) {
        let mut seen = HashSet::new();
        self.words = self
            .words
            .iter()
            .map(|w| normalize_word(w))
            .filter(|w| !w.is_empty() && seen.insert(w.clone()))
            .collect();
    }

    fn validate(&self) -> ScoringResult<()> {
        if self.words.is_empty() {
            return Err(ScoringError::content(Self::KIND, "at least one word is required"));
        }
        if let Some(word) = self.words.iter().find(|w| !w.chars().all(char::is_alphabetic)) {
            return Err(ScoringError::content(
                Self::KIND,
                format!("'{word}' must only contain letters"),
            ));
        }
        Ok(())
    }

    fn prepare<R: Rng + ?Sized>(&mut self, rng: &mut R) -> ScoringResult<()> {
        if self.grid.is_empty() {
            self.grid = generate_grid(&self.words, rng)?;
        }
        Ok(())
    }

    fn score(&self, _description: &str, answers: &Self::Answers) -> ScoreReport {
        let targets: Vec<String> = self.words.iter().map(|w| normalize_word(w)).collect();

        let mut seen = HashSet::new();
        let found: Vec<String> = answers
            .words()
            .map(normalize_word)
            .filter(|w| seen.insert(w.clone()))
            .collect();

        let details = targets
            .iter()
            .enumerate()
            .map(|(idx, word)| {
                let is_found = found.contains(word);
                let item = ItemFeedback::new(idx, is_found).expected(word);
                if is_found {
                    item.given(word)
                } else {
                    item.note("mot non trouvé")
                }
            })
            .collect();

        let unmatched = found.into_iter().filter(|w| !targets.contains(w)).collect();
        ScoreReport::from_items(details).with_unmatched(unmatched)
    }

    fn student_view<R: Rng + ?Sized>(&self, _rng: &mut R) -> Value {
        json!({ "words": self.words, "grid": self.grid })
    }
}

fn normalize_word(word: &str) -> String {
    word.trim().to_uppercase()
}

type Grid = Vec<Vec<Option<char>>>;

/// Places every word in a square grid and fills the remaining cells with random letters.
pub fn generate_grid<R: Rng + ?Sized>(words: &[String], rng: &mut R) -> ScoringResult<Vec<String>> {
    let mut words: Vec<Vec<char>> = words
        .iter()
        .map(|w| normalize_word(w).chars().collect::<Vec<_>>())
        .filter(|w| !w.is_empty())
        .collect();

    if let Some(word) = words.iter().find(|w| !w.iter().all(|c| c.is_alphabetic())) {
        return Err(ScoringError::GridGeneration(format!(
            "'{}' must only contain letters",
            word.iter().collect::<String>()
        )));
    }

    let longest = words.iter().map(Vec::len).max().unwrap_or(0);
    let size = MIN_GRID_SIZE.max(longest + 2);

    for _ in 0..GRID_TRIES {
        words.shuffle(rng);
        let mut grid: Grid = vec![vec![None; size]; size];
        if words.iter().all(|word| place_word(&mut grid, word, rng)) {
            return Ok(fill(grid, rng));
        }
    }

    Err(ScoringError::GridGeneration(format!(
        "could not place {} words in a {size}x{size} grid",
        words.len()
    )))
}

fn place_word<R: Rng + ?Sized>(grid: &mut Grid, word: &[char], rng: &mut R) -> bool {
    let size = grid.len();
    let len = word.len();
    if len > size {
        return false;
    }

    for _ in 0..PLACEMENT_TRIES {
        let Some(&(dx, dy)) = DIRECTIONS.choose(rng) else {
            return false;
        };

        let x = match dx {
            0 => rng.random_range(0..size),
            _ => rng.random_range(0..=size - len),
        };
        let y = match dy {
            1 => rng.random_range(0..=size - len),
            -1 => rng.random_range(len - 1..size),
            _ => rng.random_range(0..size),
        };

        let cells: Vec<(usize, usize)> = (0..len)
            .map(|i| {
                let cx = x as isize + dx * i as isize;
                let cy = y as isize + dy * i as isize;
                (cx as usize, cy as usize)
            })
            .collect();

        let fits = cells
            .iter()
            .zip(word)
            .all(|(&(cx, cy), letter)| grid[cy][cx].is_none_or(|c| c == *letter));

        if fits {
            for (&(cx, cy), letter) in cells.iter().zip(word) {
                grid[cy][cx] = Some(*letter);
            }
            return true;
        }
    }
    false
}

fn fill<R: Rng + ?Sized>(grid: Grid, rng: &mut R) -> Vec<String> {
    grid.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| {
                    cell.unwrap_or_else(|| FILL_LETTERS[rng.random_range(0..FILL_LETTERS.len())] as char)
                })
                .collect()
        })
        .collect()
}
