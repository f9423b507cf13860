/**
 * Loading question banks from JSON.
 *
 * Two document shapes are understood. An object with a `questions` array holds
 * source records:
 *
 *   { "source": "P2F", "question_number": 7, "question": "...",
 *     "options": { "A": "...", "B": "...", "C": "...", "D": "..." },
 *     "correct_option": "B", "rationale": "...", "syllabus_ref": "Plans" }
 *
 * An array at the root holds records that are already close to `Question`:
 *
 *   { "id": "Q7", "question": "...", "options": ["...", "...", "...", "..."],
 *     "correctIndex": 1, "rationale": "...", "topic": "Plans" }
 */
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::common::{QuizError, Result};
use super::quiz::{letter_to_index, Question, NO_RATIONALE};


const OPTION_KEYS: [&str; 4] = ["A", "B", "C", "D"];
const DEFAULT_SOURCE: &str = "SRC";
const DEFAULT_TOPIC: &str = "General";
const DEFAULT_FLAT_TOPIC: &str = "Uncategorized";


/// How to treat records that fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Skip malformed records and keep going.
    Lenient,
    /// Fail the whole load on the first malformed record or duplicate identifier.
    Strict,
}


/// All the valid questions in a bank, in the order they appear in the file.
#[derive(Debug, Default)]
pub struct Bank {
    pub questions: Vec<Question>,
    /// How many records were skipped because they were malformed.
    pub dropped: usize,
}


impl Bank {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}


/// The reason a record was not turned into a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub field: String,
    pub reason: &'static str,
}


impl Rejection {
    fn new(field: &str, reason: &'static str) -> Self {
        Rejection { field: field.to_string(), reason }
    }
}


impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' {}", self.field, self.reason)
    }
}


/// Load the bank at `path`.
pub fn load_bank(path: &Path, policy: LoadPolicy) -> Result<Bank> {
    let data = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            QuizError::BankNotFound(path.to_path_buf())
        } else {
            QuizError::Io(e)
        }
    })?;
    parse_bank(&data, policy)
}


/// Parse the text of a bank, detecting its shape from the root value.
pub fn parse_bank(data: &str, policy: LoadPolicy) -> Result<Bank> {
    let root: Value = serde_json::from_str(data).map_err(QuizError::Json)?;

    let (records, flat) = match &root {
        Value::Array(records) => (records.as_slice(), true),
        Value::Object(map) => match map.get("questions") {
            Some(Value::Array(records)) => (records.as_slice(), false),
            _ => (&[][..], false),
        },
        _ => (&[][..], false),
    };

    if policy == LoadPolicy::Strict && records.is_empty() {
        return Err(QuizError::NoRecords);
    }

    let mut bank = Bank::default();
    let mut ids = HashSet::new();
    for (index, record) in records.iter().enumerate() {
        let normalized = if flat {
            normalize_flat(record, index)
        } else {
            normalize(record, index)
        };

        let question = match normalized {
            Ok(question) => question,
            Err(rejection) => {
                if policy == LoadPolicy::Strict {
                    return Err(QuizError::InvalidRecord {
                        index,
                        field: rejection.field,
                        reason: rejection.reason.to_string(),
                    });
                }
                debug!(index, %rejection, "skipping malformed record");
                bank.dropped += 1;
                continue;
            }
        };

        if !ids.insert(question.id.clone()) {
            if policy == LoadPolicy::Strict {
                return Err(QuizError::DuplicateId { index, id: question.id });
            }
            warn!(index, id = %question.id, "duplicate question id");
        }
        bank.questions.push(question);
    }

    Ok(bank)
}


/// Turn a source record into a question. `position` is the record's 0-based index in
/// the file, used when the record has no question number of its own.
pub fn normalize(raw: &Value, position: usize) -> ::std::result::Result<Question, Rejection> {
    let record = raw.as_object().ok_or_else(|| Rejection::new("record", "is not an object"))?;

    let text = required_text(record, "question")?;
    let options = match record.get("options") {
        Some(Value::Object(options)) => options,
        Some(_) => return Err(Rejection::new("options", "is not an object")),
        None => return Err(Rejection::new("options", "is missing")),
    };

    let mut extracted = Vec::with_capacity(OPTION_KEYS.len());
    for key in OPTION_KEYS.iter() {
        match options.get(*key).and_then(Value::as_str) {
            Some(option) if !option.trim().is_empty() => extracted.push(option.to_string()),
            Some(_) => return Err(Rejection::new(&format!("options.{}", key), "is blank")),
            None => {
                return Err(Rejection::new(&format!("options.{}", key), "is missing or not text"));
            }
        }
    }

    let correct = record.get("correct_option")
        .and_then(Value::as_str)
        .and_then(letter_to_index)
        .ok_or_else(|| Rejection::new("correct_option", "is not one of A, B, C or D"))?;

    let source = record.get("source").and_then(scalar_text);
    let topic = record.get("syllabus_ref")
        .and_then(scalar_text)
        .or_else(|| source.clone())
        .map(|topic| topic.trim().to_string())
        .unwrap_or_else(|| String::from(DEFAULT_TOPIC));

    let label = source.unwrap_or_else(|| String::from(DEFAULT_SOURCE));
    let number = record.get("question_number")
        .and_then(scalar_text)
        .unwrap_or_else(|| (position + 1).to_string());

    let option_rationales = match record.get("option_rationales") {
        Some(Value::Object(map)) => {
            let texts: Vec<String> = OPTION_KEYS.iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_str).map(String::from))
                .collect();
            four(texts)
        },
        Some(value) => rationale_array(value),
        None => None,
    };

    Ok(Question {
        id: format!("{}-{}", label, number),
        topic,
        text: text.to_string(),
        options: four(extracted).ok_or_else(|| Rejection::new("options", "needs four entries"))?,
        correct,
        rationale: rationale(record),
        option_rationales,
        correct_answer_text: trimmed(record, "correct_answer_text").map(String::from),
    })
}


/// Turn a record of the flat shape into a question.
pub fn normalize_flat(raw: &Value, position: usize) -> ::std::result::Result<Question, Rejection> {
    let record = raw.as_object().ok_or_else(|| Rejection::new("record", "is not an object"))?;

    let id = match record.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(Rejection::new("id", "is missing or blank")),
    };
    let text = required_text(record, "question")?;

    let options = match record.get("options") {
        Some(Value::Array(options)) if options.len() == OPTION_KEYS.len() => options,
        Some(Value::Array(_)) => return Err(Rejection::new("options", "needs four entries")),
        _ => return Err(Rejection::new("options", "is missing or not a list")),
    };
    let mut extracted = Vec::with_capacity(OPTION_KEYS.len());
    for (i, option) in options.iter().enumerate() {
        match option.as_str() {
            Some(option) if !option.trim().is_empty() => extracted.push(option.to_string()),
            _ => return Err(Rejection::new(&format!("options[{}]", i), "is blank or not text")),
        }
    }

    let correct = record.get("correctIndex")
        .and_then(Value::as_u64)
        .filter(|i| *i < OPTION_KEYS.len() as u64)
        .ok_or_else(|| Rejection::new("correctIndex", "is not an integer from 0 to 3"))?;

    debug!(position, %id, "normalized flat record");
    Ok(Question {
        id,
        topic: trimmed(record, "topic").unwrap_or(DEFAULT_FLAT_TOPIC).to_string(),
        text: text.to_string(),
        options: four(extracted).ok_or_else(|| Rejection::new("options", "needs four entries"))?,
        correct: correct as usize,
        rationale: rationale(record),
        option_rationales: record.get("optionRationales").and_then(rationale_array),
        correct_answer_text: None,
    })
}


fn required_text<'a>(
    record: &'a Map<String, Value>, key: &str) -> ::std::result::Result<&'a str, Rejection> {

    match record.get(key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text),
        Some(Value::String(_)) => Err(Rejection::new(key, "is blank")),
        Some(_) => Err(Rejection::new(key, "is not text")),
        None => Err(Rejection::new(key, "is missing")),
    }
}


/// Return the trimmed string at `key`, if it is a non-blank string.
fn trimmed<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    record.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}


fn rationale(record: &Map<String, Value>) -> String {
    match record.get("rationale") {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        _ => String::from(NO_RATIONALE),
    }
}


/// Text of a non-blank string or a non-zero number. Whole numbers print without a
/// fractional part, so `7.0` gives "7".
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.as_f64() != Some(0.0) => {
            if n.is_f64() {
                n.as_f64().map(|f| format!("{}", f))
            } else {
                Some(n.to_string())
            }
        },
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}


fn rationale_array(value: &Value) -> Option<[String; 4]> {
    let texts: Vec<String> = value.as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect();
    four(texts)
}


fn four(mut items: Vec<String>) -> Option<[String; 4]> {
    if items.len() != 4 {
        return None;
    }
    let d = items.pop()?;
    let c = items.pop()?;
    let b = items.pop()?;
    let a = items.pop()?;
    Some([a, b, c, d])
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "source": "P2F",
            "question_number": 12,
            "question": "Which principle ensures a project remains viable?",
            "options": {
                "A": "Continued business justification",
                "B": "Learn from experience",
                "C": "Manage by stages",
                "D": "Focus on products"
            },
            "correct_option": " a ",
            "rationale": "A viable business case is required throughout.",
            "syllabus_ref": " Principles "
        })
    }

    #[test]
    fn normalizes_source_record() {
        let q = normalize(&record(), 0).unwrap();
        assert_eq!(q.id, "P2F-12");
        assert_eq!(q.topic, "Principles");
        assert_eq!(q.correct, 0);
        assert_eq!(q.options[3], "Focus on products");
        assert_eq!(q.rationale, "A viable business case is required throughout.");
        assert!(q.option_rationales.is_none());
    }

    #[test]
    fn normalize_is_deterministic() {
        assert_eq!(normalize(&record(), 4), normalize(&record(), 4));
    }

    #[test]
    fn topic_falls_back_to_source_then_default() {
        let mut raw = record();
        raw["syllabus_ref"] = json!("   ");
        assert_eq!(normalize(&raw, 0).unwrap().topic, "P2F");

        raw.as_object_mut().unwrap().remove("source");
        let q = normalize(&raw, 0).unwrap();
        assert_eq!(q.topic, "General");
        assert_eq!(q.id, "SRC-12");
    }

    #[test]
    fn id_falls_back_to_position() {
        let mut raw = record();
        raw.as_object_mut().unwrap().remove("question_number");
        assert_eq!(normalize(&raw, 6).unwrap().id, "P2F-7");

        raw["question_number"] = json!(0);
        assert_eq!(normalize(&raw, 0).unwrap().id, "P2F-1");

        raw["question_number"] = json!("12b");
        assert_eq!(normalize(&raw, 0).unwrap().id, "P2F-12b");
    }

    #[test]
    fn whole_float_numbers_print_as_integers() {
        let mut raw = record();
        raw["question_number"] = json!(7.0);
        assert_eq!(normalize(&raw, 0).unwrap().id, "P2F-7");

        raw["question_number"] = json!(7.5);
        assert_eq!(normalize(&raw, 0).unwrap().id, "P2F-7.5");
    }

    #[test]
    fn numeric_source_is_used_as_text() {
        let mut raw = record();
        raw["source"] = json!(2017);
        raw["syllabus_ref"] = json!("");
        let q = normalize(&raw, 0).unwrap();
        assert_eq!(q.id, "2017-12");
        assert_eq!(q.topic, "2017");

        raw["source"] = json!(0);
        let q = normalize(&raw, 0).unwrap();
        assert_eq!(q.id, "SRC-12");
        assert_eq!(q.topic, "General");
    }

    #[test]
    fn missing_rationale_uses_placeholder() {
        let mut raw = record();
        raw["rationale"] = json!(17);
        assert_eq!(normalize(&raw, 0).unwrap().rationale, "—");
    }

    #[test]
    fn rejects_malformed_records() {
        let mut raw = record();
        raw["options"].as_object_mut().unwrap().remove("C");
        assert_eq!(normalize(&raw, 0).unwrap_err().field, "options.C");

        let mut raw = record();
        raw["options"]["B"] = json!("  ");
        assert_eq!(normalize(&raw, 0).unwrap_err().field, "options.B");

        let mut raw = record();
        raw["options"]["D"] = json!(4);
        assert_eq!(normalize(&raw, 0).unwrap_err().field, "options.D");

        let mut raw = record();
        raw["correct_option"] = json!("E");
        assert_eq!(normalize(&raw, 0).unwrap_err().field, "correct_option");

        let mut raw = record();
        raw["question"] = json!("");
        assert_eq!(normalize(&raw, 0).unwrap_err().field, "question");

        let mut raw = record();
        raw.as_object_mut().unwrap().remove("options");
        assert_eq!(normalize(&raw, 0).unwrap_err().field, "options");

        assert!(normalize(&json!("not a record"), 0).is_err());
    }

    #[test]
    fn keeps_option_rationales_and_answer_text() {
        let mut raw = record();
        raw["option_rationales"] = json!({"A": "yes", "B": "no", "C": "no", "D": "no"});
        raw["correct_answer_text"] = json!("Continued business justification");
        let q = normalize(&raw, 0).unwrap();
        assert_eq!(q.option_rationale(0), "yes");
        assert_eq!(q.correct_answer_text.as_deref(), Some("Continued business justification"));

        raw["option_rationales"] = json!(["yes", "no"]);
        let q = normalize(&raw, 0).unwrap();
        assert_eq!(q.option_rationale(1), "not provided");
    }

    #[test]
    fn normalizes_flat_record() {
        let raw = json!({
            "id": "Q1",
            "question": "What is a stage?",
            "options": ["a", "b", "c", "d"],
            "correctIndex": 2,
            "optionRationales": ["w", "x", "y", "z"]
        });
        let q = normalize_flat(&raw, 0).unwrap();
        assert_eq!(q.id, "Q1");
        assert_eq!(q.topic, "Uncategorized");
        assert_eq!(q.correct, 2);
        assert_eq!(q.rationale, "—");
        assert_eq!(q.option_rationale(3), "z");

        let bad = json!({"id": "Q1", "question": "?", "options": ["a", "b", "c", "d"], "correctIndex": 4});
        assert_eq!(normalize_flat(&bad, 0).unwrap_err().field, "correctIndex");

        let bad = json!({"id": "Q1", "question": "?", "options": ["a", "b", "c"], "correctIndex": 0});
        assert_eq!(normalize_flat(&bad, 0).unwrap_err().field, "options");
    }

    #[test]
    fn lenient_load_drops_bad_records() {
        let data = json!({
            "questions": [
                record(),
                {"question": "No options", "correct_option": "A"},
                {"source": "P2F", "question_number": 13, "question": "Q?",
                 "options": {"A": "a", "B": "b", "C": "c", "D": "d"}, "correct_option": "d"}
            ]
        }).to_string();

        let bank = parse_bank(&data, LoadPolicy::Lenient).unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.dropped, 1);
        assert_eq!(bank.questions[1].id, "P2F-13");
        assert_eq!(bank.questions[1].correct, 3);
    }

    #[test]
    fn lenient_load_of_unexpected_shape_is_empty() {
        let bank = parse_bank(r#"{"items": []}"#, LoadPolicy::Lenient).unwrap();
        assert!(bank.is_empty());

        let bank = parse_bank("42", LoadPolicy::Lenient).unwrap();
        assert!(bank.is_empty());
    }

    #[test]
    fn lenient_load_keeps_duplicate_ids() {
        let data = json!({"questions": [record(), record()]}).to_string();
        let bank = parse_bank(&data, LoadPolicy::Lenient).unwrap();
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn ids_are_distinct_for_distinct_sources() {
        let mut records = Vec::new();
        for source in &["P2F", "P2P"] {
            for n in 1..=5 {
                let mut raw = record();
                raw["source"] = json!(source);
                raw["question_number"] = json!(n);
                records.push(raw);
            }
        }
        let data = json!({ "questions": records }).to_string();
        let bank = parse_bank(&data, LoadPolicy::Strict).unwrap();

        let ids: HashSet<&str> = bank.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn strict_load_names_field_and_index() {
        let mut bad = record();
        bad["correct_option"] = json!("Z");
        let data = json!({"questions": [record(), bad]}).to_string();

        match parse_bank(&data, LoadPolicy::Strict) {
            Err(QuizError::InvalidRecord { index, field, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(field, "correct_option");
            },
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn strict_load_rejects_duplicates_and_empty_banks() {
        let data = json!({"questions": [record(), record()]}).to_string();
        match parse_bank(&data, LoadPolicy::Strict) {
            Err(QuizError::DuplicateId { index, id }) => {
                assert_eq!(index, 1);
                assert_eq!(id, "P2F-12");
            },
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(matches!(parse_bank("[]", LoadPolicy::Strict), Err(QuizError::NoRecords)));
    }

    #[test]
    fn unparseable_json_is_an_error() {
        assert!(matches!(parse_bank("{", LoadPolicy::Lenient), Err(QuizError::Json(_))));
    }
}
