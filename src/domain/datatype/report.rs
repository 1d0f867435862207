use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const UNAVAILABLE: &str = "N/A";

/// Instruction sent along with every image.
pub const ANALYSIS_PROMPT: &str = r#"
Analyze this food image and provide detailed nutritional information in the following JSON format ONLY.
Do not include any other text before or after the JSON:

{
    "food_name": "Name of the food item",
    "category": "Food category (e.g., Fruit, Vegetable, Grain, Protein, Dairy, etc.)",
    "calories_per_100g": "Estimated calories per 100 grams (number only)",
    "nutritional_info": {
        "protein": "Protein content in grams per 100g (number only)",
        "carbohydrates": "Carbohydrate content in grams per 100g (number only)",
        "fat": "Fat content in grams per 100g (number only)",
        "fiber": "Fiber content in grams per 100g (number only)",
        "sugar": "Sugar content in grams per 100g (number only)",
        "sodium": "Sodium content in mg per 100g (number only)"
    },
    "vitamins_minerals": {
        "vitamin_c": "Vitamin C content with units",
        "vitamin_a": "Vitamin A content with units",
        "iron": "Iron content with units",
        "calcium": "Calcium content with units",
        "potassium": "Potassium content with units"
    },
    "health_benefits": ["List of 3-5 key health benefits"],
    "allergens": ["List of potential allergens if any"],
    "storage_tips": "Brief storage recommendation",
    "preparation_suggestions": ["List of 2-3 preparation methods"],
    "serving_size": "Standard serving size",
    "glycemic_index": "Low/Medium/High",
    "dietary_restrictions": ["Applicable dietary categories like Vegan, Vegetarian, Gluten-free, etc."]
}

Provide accurate nutritional information. If you cannot identify the food clearly, set food_name to "Unidentified food item".
"#;

const NUTRITIONAL_INFO: &[&str] = &["protein", "carbohydrates", "fat", "fiber", "sugar", "sodium"];
const VITAMINS_MINERALS: &[&str] = &["vitamin_c", "vitamin_a", "iron", "calcium", "potassium"];

#[derive(Debug, Clone, Copy)]
enum Field {
    Text,
    List,
    Object(&'static [&'static str]),
}

impl Field {
    fn placeholder(self) -> Value {
        match self {
            Field::Text => Value::from(UNAVAILABLE),
            Field::List => Value::Array(Vec::new()),
            Field::Object(keys) => unavailable_object(keys),
        }
    }
}

const SCHEMA: &[(&str, Field)] = &[
    ("food_name", Field::Text),
    ("category", Field::Text),
    ("calories_per_100g", Field::Text),
    ("nutritional_info", Field::Object(NUTRITIONAL_INFO)),
    ("vitamins_minerals", Field::Object(VITAMINS_MINERALS)),
    ("health_benefits", Field::List),
    ("allergens", Field::List),
    ("storage_tips", Field::Text),
    ("preparation_suggestions", Field::List),
    ("serving_size", Field::Text),
    ("glycemic_index", Field::Text),
    ("dietary_restrictions", Field::List),
];

fn unavailable_object(keys: &[&str]) -> Value {
    Value::Object(
        keys.iter()
            .map(|key| (key.to_string(), Value::from(UNAVAILABLE)))
            .collect(),
    )
}

lazy_static! {
    static ref JSON_FENCE: Regex =
        Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("Expect a valid json fence regex");
    static ref ANY_FENCE: Regex =
        Regex::new(r"(?s)```[A-Za-z0-9_+-]*\s*(.*?)\s*```").expect("Expect a valid fence regex");
}

fn parse_fenced(re: &Regex, text: &str) -> Option<Value> {
    let body = re.captures(text)?.get(1)?.as_str();
    serde_json::from_str(body).ok()
}

fn parse_braced(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Best-effort extraction of a JSON value from a free-text model reply.
///
/// Tries, in order: the first fenced block tagged `json`, the first fenced
/// block of any kind, the span from the first `{` to the last `}`, and the
/// whole trimmed text. The first candidate that parses wins.
pub fn extract_json(text: &str) -> Option<Value> {
    parse_fenced(&JSON_FENCE, text)
        .or_else(|| parse_fenced(&ANY_FENCE, text))
        .or_else(|| parse_braced(text))
        .or_else(|| serde_json::from_str(text.trim()).ok())
}

/// Food report stored with every analysis, always a JSON object holding at
/// least the keys of the requested schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodReport(Map<String, Value>);

impl FoodReport {
    /// Builds a report from the raw reply of the model.
    ///
    /// Replies without an extractable JSON object produce a placeholder
    /// report flagged with `parsing_error` and holding the raw reply.
    pub fn from_model_reply(reply: &str) -> Self {
        let reply = reply.trim();
        match extract_json(reply) {
            Some(Value::Object(map)) => Self::coerce(map),
            _ => Self::unparsed(reply),
        }
    }

    /// Fills every schema key missing from `map` with its placeholder.
    pub fn coerce(mut map: Map<String, Value>) -> Self {
        for (key, field) in SCHEMA {
            if !map.contains_key(*key) {
                map.insert(key.to_string(), field.placeholder());
            }
        }
        Self(map)
    }

    fn unparsed(reply: &str) -> Self {
        let mut report = Self::coerce(Map::new());
        report.set("food_name", "Unable to identify food item");
        report.set("category", "Unknown");
        report.set("health_benefits", json!(["Analysis could not be completed"]));
        report.set("storage_tips", "Store according to food type");
        report.set("preparation_suggestions", json!(["Cook as desired"]));
        report.set("raw_response", reply);
        report.set("parsing_error", true);
        report
    }

    /// Report used when the model could not be reached or refused the request.
    pub fn failed(message: impl std::fmt::Display) -> Self {
        let mut report = Self::coerce(Map::new());
        report.set("error", format!("Failed to analyze food: {message}"));
        report.set("food_name", "Analysis Failed");
        report.set("category", "Unknown");
        report.set("vitamins_minerals", Value::Object(Map::new()));
        report
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_owned(), value.into());
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn food_name(&self) -> &str {
        self.0
            .get("food_name")
            .and_then(Value::as_str)
            .unwrap_or(UNAVAILABLE)
    }

    pub fn is_parsing_error(&self) -> bool {
        self.0
            .get("parsing_error")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
