//! Flatten a finalized response into one tabular row.
//!
//! The first cell is `TemplateName`; every answer follows as
//! `"{SectionName}-{Id}"` → response, in interview order.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::model::ConversationResponse;

/// Column header of the template name cell.
pub const TEMPLATE_NAME_COLUMN: &str = "TemplateName";

/// One exported row: ordered `(column, value)` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRow {
    pub cells: Vec<(String, String)>,
}

impl ResponseRow {
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }
}

/// Serializes as one JSON object whose keys keep the row's column order.
impl Serialize for ResponseRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Flatten `response` into a row.
pub fn flatten(response: &ConversationResponse) -> ResponseRow {
    let mut cells = vec![(
        TEMPLATE_NAME_COLUMN.to_string(),
        response.template_name.clone(),
    )];
    for section in &response.section_responses {
        for answer in &section.question_responses {
            cells.push((
                format!("{}-{}", section.section_name, answer.id),
                answer.response.clone(),
            ));
        }
    }
    ResponseRow { cells }
}
