use super::step::Step;
use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// 1つの迷路のステップ記録（`{"Steps": [...]}`）
#[derive(Debug, Clone, Deserialize)]
struct StepRecord {
    #[serde(rename = "Steps")]
    steps: Option<Vec<Step>>,
}

/// 名前付き迷路1つ分のトレース
#[derive(Debug, Clone, PartialEq)]
pub struct MazeTrace {
    pub title: String,
    /// 読み込みに失敗した迷路は `None`。ティックごとにスキップされる
    pub steps: Option<Vec<Step>>,
}

impl MazeTrace {
    pub fn new(title: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            title: title.into(),
            steps: Some(steps),
        }
    }

    pub fn broken(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            steps: None,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.as_ref().and_then(|steps| steps.get(index))
    }
}

/// 迷路タイトルごとのステップ列。並びは元のオブジェクトのキー順
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepsData {
    mazes: Vec<MazeTrace>,
}

impl StepsData {
    pub fn new() -> Self {
        Self::default()
    }

    /// 迷路を追加する。同じタイトルがあれば置き換える
    pub fn insert(&mut self, trace: MazeTrace) {
        match self.mazes.iter_mut().find(|m| m.title == trace.title) {
            Some(existing) => *existing = trace,
            None => self.mazes.push(trace),
        }
    }

    pub fn with_maze(mut self, title: impl Into<String>, steps: Vec<Step>) -> Self {
        self.insert(MazeTrace::new(title, steps));
        self
    }

    pub fn mazes(&self) -> &[MazeTrace] {
        &self.mazes
    }

    pub fn get(&self, title: &str) -> Option<&MazeTrace> {
        self.mazes.iter().find(|m| m.title == title)
    }

    pub fn len(&self) -> usize {
        self.mazes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mazes.is_empty()
    }

    /// 一番長いステップ列の長さ
    pub fn longest(&self) -> usize {
        self.mazes.iter().map(MazeTrace::len).max().unwrap_or(0)
    }

    /// `index` 以降にまだステップが残っている迷路があるか
    pub fn has_steps_at(&self, index: usize) -> bool {
        self.mazes.iter().any(|m| index < m.len())
    }

    /// `allStepsData` 形式の JSON を読み込む
    ///
    /// トップレベルがオブジェクトでなければエラー。個々の迷路の壊れたエントリは
    /// ログに残して broken として保持する。
    pub fn from_json(source: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::new()),
            other => {
                let err = <serde_json::Error as serde::de::Error>::custom(format!(
                    "expected an object keyed by maze title, found {}",
                    json_kind(&other)
                ));
                return Err(err.into());
            }
        };

        let mut data = Self::new();
        for (title, entry) in map {
            let trace = match serde_json::from_value::<Option<StepRecord>>(entry) {
                Ok(Some(StepRecord { steps: Some(steps) })) => MazeTrace::new(title, steps),
                Ok(_) => {
                    log::warn!("Maze '{}' has no Steps array", title);
                    MazeTrace::broken(title)
                }
                Err(e) => {
                    log::warn!("Failed to decode steps of maze '{}': {}", title, e);
                    MazeTrace::broken(title)
                }
            };
            data.insert(trace);
        }

        log::debug!(
            "Loaded steps data: {} mazes, longest trace {} steps",
            data.len(),
            data.longest()
        );
        Ok(data)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::step::StepType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_titles_keep_source_order() {
        let data = StepsData::from_json(
            r#"{"zeta": {"Steps": []}, "alpha": {"Steps": []}, "mid": {"Steps": []}}"#,
        )
        .unwrap();
        let titles: Vec<&str> = data.mazes().iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_broken_entries_are_kept() {
        let data = StepsData::from_json(
            r#"{
                "ok": {"Steps": [{"Pos": [0, 0], "Type": 3}]},
                "null": null,
                "no_steps": {"Other": 1},
                "bad_step": {"Steps": [{"Pos": "x"}]}
            }"#,
        )
        .unwrap();

        assert_eq!(data.len(), 4);
        assert_eq!(data.get("ok").unwrap().len(), 1);
        assert!(data.get("null").unwrap().steps.is_none());
        assert!(data.get("no_steps").unwrap().steps.is_none());
        assert!(data.get("bad_step").unwrap().steps.is_none());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(StepsData::from_json("[1, 2]").is_err());
        assert!(StepsData::from_json("null").unwrap().is_empty());
    }

    #[test]
    fn test_has_steps_at() {
        let data = StepsData::new()
            .with_maze("a", vec![Step::new(0, 0, StepType::Code(2))])
            .with_maze(
                "b",
                vec![
                    Step::new(0, 0, StepType::Code(2)),
                    Step::new(0, 1, StepType::Code(2)),
                ],
            );
        assert_eq!(data.longest(), 2);
        assert!(data.has_steps_at(1));
        assert!(!data.has_steps_at(2));
    }

    #[test]
    fn test_trace_step_lookup() {
        let trace = MazeTrace::new("m", vec![Step::new(0, 1, StepType::Code(4))]);
        assert_eq!(trace.step(0).map(Step::col), Some(1));
        assert!(trace.step(1).is_none());
        assert!(MazeTrace::broken("x").step(0).is_none());
    }

    #[test]
    fn test_insert_replaces_same_title() {
        let mut data = StepsData::new().with_maze("a", vec![]);
        data.insert(MazeTrace::broken("a"));
        assert_eq!(data.len(), 1);
        assert!(data.get("a").unwrap().steps.is_none());
    }
}
