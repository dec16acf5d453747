use serde::Deserialize;

/// 迷路内の位置 `[row, col]`
pub type Pos = [i64; 2];

/// 記録された探索ステップの種類
///
/// 数値コード（セルの役割）か文字列タグ（`"push"` / `"pop"`）のどちらかで届く。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StepType {
    Code(i64),
    Tag(String),
}

/// 探索トレースの1ステップ
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    #[serde(rename = "Pos")]
    pub pos: Pos,
    #[serde(rename = "Type")]
    pub kind: StepType,
    /// 探索方向（描画には使わない）
    #[serde(rename = "Dir", default)]
    pub dir: Option<[i64; 2]>,
}

/// セルの役割。数値コード 0〜5 に対応する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRole {
    Floor,
    Wall,
    Checked,
    Start,
    End,
    Path,
}

impl CellRole {
    /// 未知のコードは床として扱う
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => CellRole::Wall,
            2 => CellRole::Checked,
            3 => CellRole::Start,
            4 => CellRole::End,
            5 => CellRole::Path,
            _ => CellRole::Floor,
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            CellRole::Floor => "floor",
            CellRole::Wall => "wall",
            CellRole::Checked => "checked",
            CellRole::Start => "start",
            CellRole::End => "end",
            CellRole::Path => "path",
        }
    }
}

/// 探索の訪問アクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitAction {
    Push,
    Pop,
}

impl VisitAction {
    pub fn class_name(self) -> &'static str {
        match self {
            VisitAction::Push => "push",
            VisitAction::Pop => "pop",
        }
    }
}

/// ステップがセルに与える見た目の変化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellEffect {
    /// セル内のマーカー要素のクラスを置き換える
    SetClass(CellRole),
    /// 新しいマーカー要素を追加する（既存のマーカーは残す）
    AppendMarker(VisitAction),
}

impl Step {
    pub fn new(row: i64, col: i64, kind: StepType) -> Self {
        Self {
            pos: [row, col],
            kind,
            dir: None,
        }
    }

    pub fn row(&self) -> i64 {
        self.pos[0]
    }

    pub fn col(&self) -> i64 {
        self.pos[1]
    }

    /// ステップの種類から描画効果を決める。未知の文字列タグは `None`
    pub fn effect(&self) -> Option<CellEffect> {
        match &self.kind {
            StepType::Code(code) => Some(CellEffect::SetClass(CellRole::from_code(*code))),
            StepType::Tag(tag) => match tag.trim() {
                "push" => Some(CellEffect::AppendMarker(VisitAction::Push)),
                "pop" => Some(CellEffect::AppendMarker(VisitAction::Pop)),
                // 数値を文字列で持つトレースもある
                other => other
                    .parse::<i64>()
                    .ok()
                    .map(|code| CellEffect::SetClass(CellRole::from_code(code))),
            },
        }
    }
}

/// コード値から CSS クラス名を引く
pub fn class_for_code(code: i64) -> &'static str {
    CellRole::from_code(code).class_name()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_class_table() {
        let classes: Vec<&str> = (0..=5).map(class_for_code).collect();
        assert_eq!(classes, vec!["floor", "wall", "checked", "start", "end", "path"]);
    }

    #[test]
    fn test_unknown_code_is_floor() {
        assert_eq!(class_for_code(6), "floor");
        assert_eq!(class_for_code(-1), "floor");
        assert_eq!(class_for_code(99), "floor");
    }

    #[test]
    fn test_deserialize_numeric_type() {
        let step: Step = serde_json::from_str(r#"{"Pos":[2,3],"Type":5}"#).unwrap();
        assert_eq!(step.pos, [2, 3]);
        assert_eq!(step.kind, StepType::Code(5));
        assert_eq!(step.effect(), Some(CellEffect::SetClass(CellRole::Path)));
    }

    #[test]
    fn test_deserialize_tag_type_with_dir() {
        let step: Step =
            serde_json::from_str(r#"{"Pos":[0,1],"Type":"push","Dir":[1,0]}"#).unwrap();
        assert_eq!(step.dir, Some([1, 0]));
        assert_eq!(step.effect(), Some(CellEffect::AppendMarker(VisitAction::Push)));
    }

    #[test]
    fn test_numeric_string_uses_code_table() {
        let step = Step::new(0, 0, StepType::Tag("2".to_string()));
        assert_eq!(step.effect(), Some(CellEffect::SetClass(CellRole::Checked)));
    }

    #[test]
    fn test_unknown_tag_has_no_effect() {
        let step = Step::new(0, 0, StepType::Tag("visit".to_string()));
        assert_eq!(step.effect(), None);
    }
}
