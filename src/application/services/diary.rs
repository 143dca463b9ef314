//! Diary generation - randomized column values and template merge
//!
//! The diary template is a docx table with one column per day. Each cell
//! carries a placeholder named `{column_block_cell}`; blocks are the row
//! groups of the fixed diary layout (date, breath holds, pulse readings,
//! well-being checkmarks). Filling a column means producing a value for
//! every placeholder of that column.

use rand::Rng;

use crate::application::errors::DocumentError;
use crate::domain::entities::UserProfile;
use crate::infrastructure::document::DocxTemplate;

/// Last diary column (the template covers 26 days)
pub const LAST_COLUMN: u32 = 26;

/// Upper bound for the empty-column scan
pub const COLUMN_SCAN_BOUND: u32 = 100;

/// Breath-hold seconds (inhale and exhale rows)
const BREATH_HOLD: (i32, i32) = (25, 40);
/// Orthostatic pulse delta
const ORTHOSTATIC_DELTA: (i32, i32) = (8, 12);
/// Resting pulse
const RESTING_PULSE: (i32, i32) = (60, 70);
/// Pulse recovery minutes after exercise
const RECOVERY_MINUTES: (i32, i32) = (2, 6);
/// Step-test workload, constant in the diary layout
const STEP_TEST_LOAD: i32 = 200;
/// Share of "+" answers in the well-being rows
const POSITIVE_BIAS: f64 = 0.9;

/// Outcome of a fill request
pub enum FillOutcome {
    /// The completed document, ready to send back
    Filled(Vec<u8>),
    /// No empty column found within the scan bound
    NotATemplate,
}

/// Fills diary templates with randomized physiological readings
pub struct DiaryService;

impl DiaryService {
    pub fn new() -> Self {
        Self
    }

    /// Merge randomized values and the user's stored metrics into an
    /// uploaded template.
    pub fn fill(&self, document: &[u8], profile: &UserProfile) -> Result<FillOutcome, DocumentError> {
        let mut template = DocxTemplate::from_bytes(document)?;

        let Some(first_empty) = first_empty_column(&template) else {
            return Ok(FillOutcome::NotATemplate);
        };

        let mut values = fill_table(first_empty);
        if let Some(metrics) = &profile.metrics {
            values.push(("height".to_string(), format_number(metrics.height)));
            values.push(("weight".to_string(), format_number(metrics.weight)));
        }
        if let Some(bmi) = profile.bmi {
            values.push(("imt".to_string(), format!("{:.2}", bmi)));
        }

        template.render(&values);
        Ok(FillOutcome::Filled(template.into_bytes()?))
    }
}

impl Default for DiaryService {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the first column whose date placeholder is still present, scanning
/// at most `COLUMN_SCAN_BOUND` columns. `None` means every column has
/// already been filled (or the document is not a diary template at all).
pub fn first_empty_column(template: &DocxTemplate) -> Option<u32> {
    (1..=COLUMN_SCAN_BOUND).find(|column| template.contains_placeholder(&format!("{}_0_1", column)))
}

/// Generate values for all remaining columns, `from_column..=LAST_COLUMN`
pub fn fill_table(from_column: u32) -> Vec<(String, String)> {
    let mut values = Vec::new();
    for column in from_column..=LAST_COLUMN {
        fill_column(column, &mut values);
    }
    values
}

/// Generate the fixed-shape placeholder/value pairs for one column
pub fn fill_column(column: u32, values: &mut Vec<(String, String)>) {
    let mut rng = rand::thread_rng();
    let mut block = 0u32;
    let mut push = |block: u32, cell: u32, value: String| {
        values.push((format!("{}_{}_{}", column, block, cell), value));
    };

    // Date, left for the user to fill in
    push(block, 1, String::new());
    block += 1;

    // Breath holds on inhale and exhale
    push(block, 1, rng.gen_range(BREATH_HOLD.0..=BREATH_HOLD.1).to_string());
    push(block, 2, rng.gen_range(BREATH_HOLD.0..=BREATH_HOLD.1).to_string());
    block += 1;

    // Pulse readings
    push(block, 1, rng.gen_range(ORTHOSTATIC_DELTA.0..=ORTHOSTATIC_DELTA.1).to_string());
    push(block, 2, rng.gen_range(RESTING_PULSE.0..=RESTING_PULSE.1).to_string());
    push(block, 3, rng.gen_range(RECOVERY_MINUTES.0..=RECOVERY_MINUTES.1).to_string());
    push(block, 4, STEP_TEST_LOAD.to_string());
    block += 1;

    // Notes row
    push(block, 1, String::new());
    block += 1;

    // Well-being, sleep, appetite, mood: mostly positive
    for _ in 0..4 {
        if rng.gen_bool(POSITIVE_BIAS) {
            push(block, 1, "+".to_string());
            push(block, 2, String::new());
        } else {
            push(block, 1, String::new());
            push(block, 2, "+".to_string());
        }
        push(block, 3, String::new());
        block += 1;
    }

    // Desire to exercise
    push(block, 1, "+".to_string());
    push(block, 2, String::new());
    block += 1;

    // Training adherence
    push(block, 1, "+".to_string());
    push(block, 2, String::new());
    push(block, 3, String::new());
    block += 1;

    // Regimen violations
    push(block, 1, "+".to_string());
    push(block, 2, String::new());
}

/// Render whole numbers without a trailing ".0"
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
