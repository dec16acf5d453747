// メモリ上のページ
//
// ネイティブ実行とテスト用。DOM と同じく外周1マスの壁を持つフラットな
// セル列を保持し、再生の結果をそのまま観察できる。

use super::{GridLayer, PageSurface};
use crate::error::{PlaybackError, Result};

/// 1セル分の状態
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryCell {
    /// グリッド生成時のクラス（`wall` / `floor`）
    pub base_class: String,
    /// マーカー要素のクラス（`set_cell_class` で置き換わる）
    pub marker: Option<String>,
    /// 追加されたマーカー要素（古い順）
    pub markers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryGrid {
    pub columns: usize,
    pub cells: Vec<MemoryCell>,
}

impl MemoryGrid {
    /// 外周を壁で囲んだ `rows` x `cols` のグリッド
    fn bordered(rows: usize, cols: usize) -> Self {
        let columns = cols + 2;
        let total_rows = rows + 2;
        let cells = (0..total_rows * columns)
            .map(|i| {
                let (r, c) = (i / columns, i % columns);
                let border = r == 0 || c == 0 || r == total_rows - 1 || c == columns - 1;
                MemoryCell {
                    base_class: if border { "wall" } else { "floor" }.to_string(),
                    ..Default::default()
                }
            })
            .collect();
        Self { columns, cells }
    }

    pub fn rows(&self) -> usize {
        if self.columns == 0 {
            0
        } else {
            self.cells.len() / self.columns
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryMaze {
    pub title: String,
    pub cells: Option<MemoryGrid>,
    pub steps: Option<MemoryGrid>,
    pub status: Option<String>,
}

impl MemoryMaze {
    fn grid(&self, layer: GridLayer) -> Option<&MemoryGrid> {
        match layer {
            GridLayer::Cells => self.cells.as_ref(),
            GridLayer::Steps => self.steps.as_ref(),
        }
    }

    fn grid_mut(&mut self, layer: GridLayer) -> Option<&mut MemoryGrid> {
        match layer {
            GridLayer::Cells => self.cells.as_mut(),
            GridLayer::Steps => self.steps.as_mut(),
        }
    }
}

/// メモリ上のページ
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    mazes: Vec<MemoryMaze>,
    playback_label: String,
    speed_label: Option<u32>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// `rows` x `cols` の迷路を追加する
    pub fn add_maze(&mut self, title: impl Into<String>, rows: usize, cols: usize) -> &mut Self {
        self.mazes.push(MemoryMaze {
            title: title.into(),
            cells: Some(MemoryGrid::bordered(rows, cols)),
            steps: None,
            status: None,
        });
        self
    }

    /// セルグリッドと同じ大きさのステップレイヤー付きで迷路を追加する
    pub fn add_layered_maze(
        &mut self,
        title: impl Into<String>,
        rows: usize,
        cols: usize,
    ) -> &mut Self {
        self.mazes.push(MemoryMaze {
            title: title.into(),
            cells: Some(MemoryGrid::bordered(rows, cols)),
            steps: Some(MemoryGrid::bordered(rows, cols)),
            status: None,
        });
        self
    }

    /// グリッド要素をページから外す
    pub fn detach_grid(&mut self, title: &str, layer: GridLayer) {
        if let Some(maze) = self.mazes.iter_mut().find(|m| m.title == title) {
            match layer {
                GridLayer::Cells => maze.cells = None,
                GridLayer::Steps => maze.steps = None,
            }
        }
    }

    /// 迷路のグリッドを `rows` x `cols` で作り直す（レイアウトの変化）
    ///
    /// ステップレイヤーがあればそれも同じ大きさにする。描画済みの内容は消える。
    pub fn resize_maze(&mut self, title: &str, rows: usize, cols: usize) -> Result<()> {
        let maze = self.maze_mut(title)?;
        if maze.cells.is_some() {
            maze.cells = Some(MemoryGrid::bordered(rows, cols));
        }
        if maze.steps.is_some() {
            maze.steps = Some(MemoryGrid::bordered(rows, cols));
        }
        Ok(())
    }

    pub fn maze(&self, title: &str) -> Option<&MemoryMaze> {
        self.mazes.iter().find(|m| m.title == title)
    }

    pub fn mazes(&self) -> &[MemoryMaze] {
        &self.mazes
    }

    /// 迷路内座標のセル
    pub fn cell(&self, title: &str, layer: GridLayer, row: usize, col: usize) -> Option<&MemoryCell> {
        let grid = self.maze(title)?.grid(layer)?;
        grid.cells.get((row + 1) * grid.columns + col + 1)
    }

    pub fn status(&self, title: &str) -> Option<&str> {
        self.maze(title)?.status.as_deref()
    }

    pub fn playback_label(&self) -> &str {
        &self.playback_label
    }

    pub fn speed_label(&self) -> Option<u32> {
        self.speed_label
    }

    fn maze_mut(&mut self, title: &str) -> Result<&mut MemoryMaze> {
        self.mazes
            .iter_mut()
            .find(|m| m.title == title)
            .ok_or_else(|| PlaybackError::ContainerNotFound(title.to_string()))
    }

    fn cell_mut(&mut self, title: &str, layer: GridLayer, index: usize) -> Result<&mut MemoryCell> {
        let grid = self
            .maze_mut(title)?
            .grid_mut(layer)
            .ok_or_else(|| PlaybackError::GridNotFound {
                title: title.to_string(),
                layer: layer.name(),
            })?;
        grid.cells
            .get_mut(index)
            .ok_or_else(|| PlaybackError::CellNotFound {
                title: title.to_string(),
                index,
            })
    }

    /// 迷路を1文字1セルのテキストにする（外周の壁を含む）
    pub fn render_text(&self, title: &str) -> Option<String> {
        let maze = self.maze(title)?;
        let grid = maze.cells.as_ref()?;
        let mut out = String::with_capacity(grid.cells.len() + grid.rows());
        for (i, cell) in grid.cells.iter().enumerate() {
            let overlay = maze.steps.as_ref().and_then(|s| s.cells.get(i));
            out.push(glyph(cell, overlay));
            if (i + 1) % grid.columns == 0 {
                out.push('\n');
            }
        }
        Some(out)
    }

    /// ターミナル向けに色を付けたテキスト
    #[cfg(feature = "native")]
    pub fn render_colored(&self, title: &str) -> Option<String> {
        use colored::Colorize;

        let text = self.render_text(title)?;
        let colored: String = text
            .chars()
            .map(|ch| match ch {
                '#' => ch.to_string().bright_black().to_string(),
                'o' => ch.to_string().cyan().to_string(),
                'S' => ch.to_string().green().bold().to_string(),
                'E' => ch.to_string().red().bold().to_string(),
                '*' => ch.to_string().yellow().bold().to_string(),
                '+' => ch.to_string().blue().to_string(),
                '-' => ch.to_string().magenta().to_string(),
                _ => ch.to_string(),
            })
            .collect();
        Some(colored)
    }
}

/// セルの見た目を1文字にする。マーカーのクラスが最優先
fn glyph(cell: &MemoryCell, overlay: Option<&MemoryCell>) -> char {
    let class = cell
        .marker
        .as_deref()
        .or_else(|| cell.markers.last().map(String::as_str))
        .or_else(|| overlay.and_then(|o| o.markers.last().map(String::as_str)))
        .unwrap_or(&cell.base_class);
    match class {
        "wall" => '#',
        "checked" => 'o',
        "start" => 'S',
        "end" => 'E',
        "path" => '*',
        "push" => '+',
        "pop" => '-',
        _ => ' ',
    }
}

impl PageSurface for MemoryPage {
    fn grid_columns(&self, title: &str, layer: GridLayer) -> Result<usize> {
        let maze = self
            .maze(title)
            .ok_or_else(|| PlaybackError::ContainerNotFound(title.to_string()))?;
        let grid = maze.grid(layer).ok_or_else(|| PlaybackError::GridNotFound {
            title: title.to_string(),
            layer: layer.name(),
        })?;
        if grid.columns == 0 {
            return Err(PlaybackError::ColumnsUnavailable(title.to_string()));
        }
        Ok(grid.columns)
    }

    fn has_layer(&self, title: &str, layer: GridLayer) -> bool {
        self.maze(title).and_then(|m| m.grid(layer)).is_some()
    }

    fn set_cell_class(&mut self, title: &str, index: usize, class: &str) -> Result<()> {
        let cell = self.cell_mut(title, GridLayer::Cells, index)?;
        cell.marker = Some(class.to_string());
        Ok(())
    }

    fn append_marker(
        &mut self,
        title: &str,
        layer: GridLayer,
        index: usize,
        class: &str,
    ) -> Result<()> {
        let cell = self.cell_mut(title, layer, index)?;
        cell.markers.push(class.to_string());
        Ok(())
    }

    fn set_status(&mut self, title: &str, text: &str) -> Result<()> {
        self.maze_mut(title)?.status = Some(text.to_string());
        Ok(())
    }

    fn set_playback_label(&mut self, label: &str) {
        self.playback_label = label.to_string();
    }

    fn set_speed_label(&mut self, speed_ms: u32) {
        self.speed_label = Some(speed_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bordered_grid() {
        let mut page = MemoryPage::new();
        page.add_maze("m", 2, 3);
        assert_eq!(page.grid_columns("m", GridLayer::Cells).unwrap(), 5);
        assert_eq!(page.render_text("m").unwrap(), "#####\n#   #\n#   #\n#####\n");
    }

    #[test]
    fn test_missing_layer_and_maze() {
        let mut page = MemoryPage::new();
        page.add_maze("m", 2, 2);
        assert!(!page.has_layer("m", GridLayer::Steps));
        assert!(matches!(
            page.grid_columns("m", GridLayer::Steps),
            Err(PlaybackError::GridNotFound { .. })
        ));
        assert!(matches!(
            page.set_status("other", "x"),
            Err(PlaybackError::ContainerNotFound(_))
        ));
    }

    #[test]
    fn test_render_text_with_markers() {
        let mut page = MemoryPage::new();
        page.add_layered_maze("m", 1, 3);
        page.set_cell_class("m", 6, "start").unwrap();
        page.append_marker("m", GridLayer::Steps, 7, "push").unwrap();
        page.set_cell_class("m", 8, "path").unwrap();
        assert_eq!(page.render_text("m").unwrap(), "#####\n#S+*#\n#####\n");
    }

    #[test]
    fn test_resize_maze() {
        let mut page = MemoryPage::new();
        page.add_layered_maze("m", 1, 1);
        page.set_cell_class("m", 4, "path").unwrap();

        page.resize_maze("m", 2, 4).unwrap();
        assert_eq!(page.grid_columns("m", GridLayer::Cells).unwrap(), 6);
        assert_eq!(page.grid_columns("m", GridLayer::Steps).unwrap(), 6);
        assert_eq!(page.cell("m", GridLayer::Cells, 0, 0).unwrap().marker, None);
        assert!(matches!(
            page.resize_maze("other", 1, 1),
            Err(PlaybackError::ContainerNotFound(_))
        ));
    }

    #[test]
    fn test_cell_out_of_range() {
        let mut page = MemoryPage::new();
        page.add_maze("m", 1, 1);
        assert!(matches!(
            page.set_cell_class("m", 9, "path"),
            Err(PlaybackError::CellNotFound { index: 9, .. })
        ));
    }
}
