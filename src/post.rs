use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single job posting as submitted by the caller.
///
/// Fields that arrive as anything but a string (`25000`, `null`, `true`)
/// read as empty text, the same rule batch cells follow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPost {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub salary_text: String,
}

fn lenient_text<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    Ok(v.as_str().unwrap_or("").to_string())
}

impl JobPost {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            salary_text: String::new(),
        }
    }

    pub fn with_salary(mut self, salary_text: impl Into<String>) -> Self {
        self.salary_text = salary_text.into();
        self
    }

    /// The exact text the model sees.
    pub fn model_text(&self) -> String {
        join_fields(&self.title, &self.description, &self.salary_text)
    }
}

/// `title description salary_text`, single-space joined, then trimmed.
/// Shared by the single-post engine and the batch runner so both feed the
/// model identical text.
pub fn join_fields(title: &str, description: &str, salary_text: &str) -> String {
    format!("{title} {description} {salary_text}").trim().to_string()
}
