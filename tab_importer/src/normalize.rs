use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::row::cell_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundStage {
    #[serde(rename = "P")]
    Preliminary,
    #[serde(rename = "E")]
    Elimination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawType {
    #[serde(rename = "R")]
    Random,
    #[serde(rename = "M")]
    Manual,
    #[serde(rename = "D")]
    RoundRobin,
    #[serde(rename = "P")]
    PowerPaired,
    #[serde(rename = "E")]
    Elimination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamPosition {
    #[serde(rename = "aff")]
    Affirmative,
    #[serde(rename = "neg")]
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerType {
    #[serde(rename = "bc")]
    BooleanCheckbox,
    #[serde(rename = "bs")]
    BooleanSelect,
    #[serde(rename = "i")]
    IntegerTextbox,
    #[serde(rename = "is")]
    IntegerScale,
    #[serde(rename = "f")]
    Float,
    #[serde(rename = "t")]
    Text,
    #[serde(rename = "tl")]
    LongText,
    #[serde(rename = "ss")]
    SingleSelect,
    #[serde(rename = "ms")]
    MultipleSelect,
}

/// Where a venue category's name is shown relative to the venue name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VenueNameDisplay {
    #[serde(rename = "S")]
    Suffix,
    #[serde(rename = "P")]
    Prefix,
}

macro_rules! impl_code {
    ($t:ty { $($variant:ident => $code:literal),* $(,)? }) => {
        impl $t {
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code),*
                }
            }
        }
    };
}

impl_code!(RoundStage { Preliminary => "P", Elimination => "E" });
impl_code!(DrawType {
    Random => "R",
    Manual => "M",
    RoundRobin => "D",
    PowerPaired => "P",
    Elimination => "E",
});
impl_code!(Gender { Male => "M", Female => "F", Other => "O" });
impl_code!(TeamPosition { Affirmative => "aff", Negative => "neg" });
impl_code!(AnswerType {
    BooleanCheckbox => "bc",
    BooleanSelect => "bs",
    IntegerTextbox => "i",
    IntegerScale => "is",
    Float => "f",
    Text => "t",
    LongText => "tl",
    SingleSelect => "ss",
    MultipleSelect => "ms",
});
impl_code!(VenueNameDisplay { Suffix => "S", Prefix => "P" });

/// A case-insensitive alias table. Tokens without an entry resolve to `None`,
/// which callers treat as "leave the field unset".
#[derive(Debug)]
pub struct Lookup<T: 'static> {
    name: &'static str,
    entries: HashMap<&'static str, T>,
}

impl<T: Copy> Lookup<T> {
    fn new(name: &'static str, groups: Vec<(Vec<&'static str>, T)>) -> Self {
        let entries = groups
            .into_iter()
            .flat_map(|(aliases, value)| aliases.into_iter().map(move |alias| (alias, value)))
            .collect();
        Lookup { name, entries }
    }

    pub fn get(&self, token: &str) -> Option<T> {
        self.entries.get(token.trim().to_lowercase().as_str()).copied()
    }

    pub fn get_cell(&self, cell: Option<&Value>) -> Option<T> {
        let token = cell.and_then(cell_text)?;
        let value = self.get(&token);
        if value.is_none() && !token.is_empty() {
            debug!("Unrecognized {} {:?}", self.name, token);
        }
        value
    }
}

lazy_static! {
    pub static ref BOOLEANS: Lookup<bool> = Lookup::new("boolean", vec![
        (vec!["true", "yes", "t", "y", "1"], true),
        (vec!["false", "no", "f", "n", "0"], false),
    ]);

    pub static ref ROUND_STAGES: Lookup<RoundStage> = Lookup::new("round stage", vec![
        (vec!["preliminary", "p"], RoundStage::Preliminary),
        (vec!["elimination", "break", "e", "b"], RoundStage::Elimination),
    ]);

    pub static ref DRAW_TYPES: Lookup<DrawType> = Lookup::new("draw type", vec![
        (vec!["random", "r"], DrawType::Random),
        (vec!["manual", "m"], DrawType::Manual),
        (vec!["round robin", "d"], DrawType::RoundRobin),
        (vec!["power paired", "p"], DrawType::PowerPaired),
        (vec!["elimination", "break", "e", "b"], DrawType::Elimination),
    ]);

    pub static ref GENDERS: Lookup<Gender> = Lookup::new("gender", vec![
        (vec!["male", "m"], Gender::Male),
        (vec!["female", "f"], Gender::Female),
        (vec!["other", "o"], Gender::Other),
    ]);

    pub static ref TEAM_POSITIONS: Lookup<TeamPosition> = Lookup::new("team position", vec![
        (vec!["affirmative", "aff", "a"], TeamPosition::Affirmative),
        (vec!["negative", "neg", "n"], TeamPosition::Negative),
    ]);

    pub static ref ANSWER_TYPES: Lookup<AnswerType> = Lookup::new("feedback answer type", vec![
        (vec!["checkbox"], AnswerType::BooleanCheckbox),
        (vec!["yes no select", "yesno"], AnswerType::BooleanSelect),
        (vec!["integer textbox", "int", "integer"], AnswerType::IntegerTextbox),
        (vec!["integer scale", "scale"], AnswerType::IntegerScale),
        (vec!["float"], AnswerType::Float),
        (vec!["text"], AnswerType::Text),
        (vec!["textbox", "long text", "longtext"], AnswerType::LongText),
        (vec!["select single", "single select"], AnswerType::SingleSelect),
        (vec!["select multiple", "multiple select"], AnswerType::MultipleSelect),
    ]);

    pub static ref VENUE_NAME_DISPLAYS: Lookup<VenueNameDisplay> =
        Lookup::new("venue category display", vec![
            (vec!["", "suffix"], VenueNameDisplay::Suffix),
            (vec!["prefix"], VenueNameDisplay::Prefix),
        ]);
}

pub fn normalize_bool(cell: Option<&Value>) -> Option<bool> {
    BOOLEANS.get_cell(cell)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_boolean_aliases() {
        for token in ["true", "yes", "t", "y", "1", "TRUE", "Yes", "T", "Y"] {
            assert_eq!(BOOLEANS.get(token), Some(true), "{}", token);
        }
        for token in ["false", "no", "f", "n", "0", "FALSE", "No", "F", "N"] {
            assert_eq!(BOOLEANS.get(token), Some(false), "{}", token);
        }
    }

    #[test]
    fn test_unknown_boolean_is_absent() {
        for token in ["", "maybe", "2", "ja", "yess"] {
            assert_eq!(BOOLEANS.get(token), None, "{}", token);
        }
    }

    #[test]
    fn test_boolean_from_typed_cells() {
        assert_eq!(normalize_bool(Some(&json!(1))), Some(true));
        assert_eq!(normalize_bool(Some(&json!(0))), Some(false));
        assert_eq!(normalize_bool(Some(&json!(true))), Some(true));
        assert_eq!(normalize_bool(Some(&json!(2.5))), None);
        assert_eq!(normalize_bool(Some(&Value::Null)), None);
        assert_eq!(normalize_bool(None), None);
    }

    #[test]
    fn test_draw_type_and_stage_share_letters() {
        assert_eq!(ROUND_STAGES.get("p"), Some(RoundStage::Preliminary));
        assert_eq!(DRAW_TYPES.get("p"), Some(DrawType::PowerPaired));
        assert_eq!(DRAW_TYPES.get("Power Paired").map(|d| d.code()), Some("P"));
        assert_eq!(DRAW_TYPES.get("round robin").map(|d| d.code()), Some("D"));
        assert_eq!(ROUND_STAGES.get("break").map(|s| s.code()), Some("E"));
    }

    #[test]
    fn test_answer_type_codes() {
        let expected = [
            ("checkbox", "bc"),
            ("yes no select", "bs"),
            ("yesno", "bs"),
            ("integer textbox", "i"),
            ("int", "i"),
            ("integer", "i"),
            ("integer scale", "is"),
            ("scale", "is"),
            ("float", "f"),
            ("text", "t"),
            ("textbox", "tl"),
            ("long text", "tl"),
            ("longtext", "tl"),
            ("select single", "ss"),
            ("single select", "ss"),
            ("select multiple", "ms"),
            ("multiple select", "ms"),
        ];
        for (alias, code) in expected {
            assert_eq!(ANSWER_TYPES.get(alias).map(|a| a.code()), Some(code), "{}", alias);
        }
    }

    #[test]
    fn test_venue_display_defaults_to_suffix() {
        assert_eq!(VENUE_NAME_DISPLAYS.get(""), Some(VenueNameDisplay::Suffix));
        assert_eq!(VENUE_NAME_DISPLAYS.get("suffix"), Some(VenueNameDisplay::Suffix));
        assert_eq!(VENUE_NAME_DISPLAYS.get("Prefix"), Some(VenueNameDisplay::Prefix));
        assert_eq!(VENUE_NAME_DISPLAYS.get("infix"), None);
    }

    #[test]
    fn test_team_positions_and_genders() {
        assert_eq!(TEAM_POSITIONS.get("A"), Some(TeamPosition::Affirmative));
        assert_eq!(TEAM_POSITIONS.get("negative").map(|p| p.code()), Some("neg"));
        assert_eq!(GENDERS.get("Female"), Some(Gender::Female));
        assert_eq!(GENDERS.get("x"), None);
    }

    #[test]
    fn test_codes_match_serialized_form() {
        assert_eq!(serde_json::to_value(AnswerType::IntegerScale).unwrap(), json!("is"));
        assert_eq!(serde_json::to_value(TeamPosition::Negative).unwrap(), json!("neg"));
        assert_eq!(serde_json::to_value(VenueNameDisplay::Prefix).unwrap(), json!("P"));
    }
}
