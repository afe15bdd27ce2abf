//! Turns spreadsheet-style rows into dishes.
//!
//! The first row is a header. Columns are found by name, so sheets may
//! order them freely and carry extra columns. Ingredient cells list
//! `"<qty> <unit> <name>"` entries separated by semicolons or line breaks:
//!
//! ```text
//! 500 g minced beef; 1 can tomatoes; 2 onions; 1/2 tsp salt
//! ```

use crate::domain::catalog::{Dish, DishCategory, EffortLevel, Ingredient};

const DEFAULT_BASE_PERSONS: u32 = 4;

const UNITS: &[&str] = &[
    "g", "kg", "mg", "ml", "cl", "dl", "l", "tsp", "tbsp", "cup", "cups", "oz", "lb", "pinch",
    "pinches", "clove", "cloves", "can", "cans", "bunch", "bunches", "slice", "slices", "piece",
    "pieces", "pc", "pcs", "pack", "packs", "tl", "el", "stk", "prise", "bund", "dose",
];

/// A row that could not be turned into a dish.
#[derive(Debug, Clone, PartialEq)]
pub struct RowIssue {
    /// 1-based sheet row number (the header is row 1).
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
struct Columns {
    name: Option<usize>,
    persons: Option<usize>,
    effort: Option<usize>,
    ingredients: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String]) -> Self {
        let mut columns = Columns::default();
        for (i, cell) in header.iter().enumerate() {
            match cell.trim().to_lowercase().as_str() {
                "name" | "dish" | "gericht" => columns.name = Some(i),
                "persons" | "servings" | "portions" | "personen" => columns.persons = Some(i),
                "effort" | "difficulty" | "aufwand" => columns.effort = Some(i),
                "ingredients" | "zutaten" => columns.ingredients = Some(i),
                _ => {}
            }
        }
        columns
    }
}

fn cell(row: &[String], column: Option<usize>) -> &str {
    column
        .and_then(|i| row.get(i))
        .map(|s| s.trim())
        .unwrap_or("")
}

/// Parses a whole sheet. Blank rows are ignored; invalid rows are reported
/// and skipped so one bad entry does not take the catalog down.
///
/// Returns `Err` only when the header has no name column.
pub fn parse_rows(
    rows: &[Vec<String>],
    category: DishCategory,
) -> Result<(Vec<Dish>, Vec<RowIssue>), String> {
    let Some((header, body)) = rows.split_first() else {
        return Ok((Vec::new(), Vec::new()));
    };
    let columns = Columns::from_header(header);
    if columns.name.is_none() {
        return Err(format!("header has no name column: {:?}", header));
    }

    let mut dishes = Vec::new();
    let mut issues = Vec::new();
    for (offset, row) in body.iter().enumerate() {
        let row_number = offset + 2;
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        match parse_row(row, &columns, category) {
            Ok(dish) => dishes.push(dish),
            Err(reason) => issues.push(RowIssue { row: row_number, reason }),
        }
    }
    Ok((dishes, issues))
}

fn parse_row(row: &[String], columns: &Columns, category: DishCategory) -> Result<Dish, String> {
    let name = cell(row, columns.name);

    let persons = match cell(row, columns.persons) {
        "" => DEFAULT_BASE_PERSONS,
        raw => raw
            .parse::<u32>()
            .map_err(|_| format!("'{}' is not a person count", raw))?,
    };

    let effort = match cell(row, columns.effort) {
        "" => EffortLevel::Medium,
        raw => raw.parse::<EffortLevel>().map_err(|e| e.to_string())?,
    };

    let mut dish = Dish::new(name, persons, effort, category).map_err(|e| e.to_string())?;
    for entry in split_ingredients(cell(row, columns.ingredients)) {
        dish = dish.with_ingredient(parse_ingredient(entry)?);
    }
    Ok(dish)
}

fn split_ingredients(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parses `"250 g spaghetti"`, `"250g spaghetti"`, `"2 onions"`, `"1/2 tsp salt"`,
/// `"1,5 l milk"`.
pub fn parse_ingredient(raw: &str) -> Result<Ingredient, String> {
    let mut tokens = raw.split_whitespace();
    let first = tokens
        .next()
        .ok_or_else(|| "empty ingredient".to_string())?;

    // "250g" carries its unit glued to the number.
    let split_at = first
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ',' || c == '/'))
        .unwrap_or(first.len());
    let (number, glued_unit) = first.split_at(split_at);
    let quantity = parse_quantity(number)
        .ok_or_else(|| format!("'{}' does not start with a quantity", raw))?;

    let rest: Vec<&str> = tokens.collect();
    let (unit, name_tokens) = if !glued_unit.is_empty() {
        (glued_unit.to_string(), rest.as_slice())
    } else {
        match rest.split_first() {
            Some((candidate, tail)) if is_unit(candidate) && !tail.is_empty() => {
                (candidate.to_string(), tail)
            }
            _ => (String::new(), rest.as_slice()),
        }
    };

    let name = name_tokens.join(" ");
    Ingredient::new(name, quantity, unit).map_err(|e| format!("'{}': {}", raw, e))
}

fn is_unit(token: &str) -> bool {
    let lower = token.trim_end_matches('.').to_lowercase();
    UNITS.contains(&lower.as_str())
}

fn parse_quantity(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    if let Some((num, den)) = raw.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        return (den != 0.0).then(|| num / den);
    }
    raw.replace(',', ".").parse().ok()
}
