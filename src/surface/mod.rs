pub mod memory;

pub use memory::MemoryPage;

use crate::error::Result;

/// 迷路グリッドのレイヤー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLayer {
    /// セルの役割を表示するメインのグリッド
    Cells,
    /// push / pop のマーカーを積むオーバーレイ
    Steps,
}

impl GridLayer {
    pub fn name(self) -> &'static str {
        match self {
            GridLayer::Cells => "cell",
            GridLayer::Steps => "step",
        }
    }
}

/// 迷路が置かれているページ
///
/// ブラウザでは実際の DOM、ネイティブとテストではメモリ上のページが実装する。
/// どのメソッドも要素が見つからなければエラーを返し、再生側はその迷路だけを
/// スキップする。
pub trait PageSurface {
    /// グリッドの列数（外周の壁を含む）。毎ティック読み直される
    fn grid_columns(&self, title: &str, layer: GridLayer) -> Result<usize>;

    /// レイヤーが存在するか
    fn has_layer(&self, title: &str, layer: GridLayer) -> bool;

    /// セル内のマーカー要素のクラスを置き換える（無ければ作る）
    fn set_cell_class(&mut self, title: &str, index: usize, class: &str) -> Result<()>;

    /// セルに新しいマーカー要素を追加する
    fn append_marker(&mut self, title: &str, layer: GridLayer, index: usize, class: &str)
    -> Result<()>;

    /// 迷路のステータス表示を更新する（無ければ作る）
    fn set_status(&mut self, title: &str, text: &str) -> Result<()>;

    /// 再生ボタンのラベル
    fn set_playback_label(&mut self, label: &str);

    /// 再生間隔の表示
    fn set_speed_label(&mut self, speed_ms: u32);
}
