use crate::config::DomSelectors;
use crate::engine::grid::{column_count, css_string_escape};
use crate::error::{PlaybackError, Result};
use crate::surface::{GridLayer, PageSurface};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Window};

fn dom_error(context: &str, err: JsValue) -> PlaybackError {
    PlaybackError::Dom(format!("{}: {:?}", context, err))
}

/// 実際の DOM 上の迷路ページ
///
/// 要素はキャッシュせず、呼ばれるたびにドキュメントから探し直す。
/// 列数もティックごとに計算済みスタイルから読む。
pub struct DomPage {
    window: Window,
    document: Document,
    selectors: DomSelectors,
}

impl DomPage {
    pub fn new(selectors: DomSelectors) -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| PlaybackError::Dom("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| PlaybackError::Dom("no document".into()))?;
        Ok(Self {
            window,
            document,
            selectors,
        })
    }

    /// タイトルに対応する迷路コンテナ
    ///
    /// `data-title` 属性で探し、無ければ見出しが同じ迷路ボックスから探す。
    fn container(&self, title: &str) -> Result<Element> {
        let selector = format!(
            ".{}[data-title=\"{}\"]",
            self.selectors.container_class,
            css_string_escape(title)
        );
        let by_attr = self
            .document
            .query_selector(&selector)
            .map_err(|e| dom_error("query container", e))?;
        if let Some(container) = by_attr {
            return Ok(container);
        }

        self.container_by_heading(title)?
            .ok_or_else(|| PlaybackError::ContainerNotFound(title.to_string()))
    }

    fn container_by_heading(&self, title: &str) -> Result<Option<Element>> {
        let boxes = self
            .document
            .query_selector_all(&format!(".{}", self.selectors.box_class))
            .map_err(|e| dom_error("query maze boxes", e))?;

        for i in 0..boxes.length() {
            let Some(maze_box) = boxes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let heading = maze_box
                .query_selector("h3")
                .map_err(|e| dom_error("query heading", e))?
                .and_then(|h| h.text_content());
            if heading.as_deref().map(str::trim) != Some(title) {
                continue;
            }
            let container = maze_box
                .query_selector(&format!(".{}", self.selectors.container_class))
                .map_err(|e| dom_error("query container", e))?;
            return Ok(Some(container.unwrap_or(maze_box)));
        }
        Ok(None)
    }

    fn grid(&self, title: &str, layer: GridLayer) -> Result<Element> {
        let class = match layer {
            GridLayer::Cells => &self.selectors.grid_class,
            GridLayer::Steps => &self.selectors.step_layer_class,
        };
        self.container(title)?
            .query_selector(&format!(".{}", class))
            .map_err(|e| dom_error("query grid", e))?
            .ok_or_else(|| PlaybackError::GridNotFound {
                title: title.to_string(),
                layer: layer.name(),
            })
    }

    fn cell(&self, title: &str, layer: GridLayer, index: usize) -> Result<Element> {
        let not_found = || PlaybackError::CellNotFound {
            title: title.to_string(),
            index,
        };
        let index = u32::try_from(index).map_err(|_| not_found())?;
        self.grid(title, layer)?
            .children()
            .item(index)
            .ok_or_else(not_found)
    }

    fn create_div(&self, class: &str) -> Result<Element> {
        let div = self
            .document
            .create_element("div")
            .map_err(|e| dom_error("create element", e))?;
        div.set_class_name(class);
        Ok(div)
    }

    fn set_text_by_id(&self, id: &str, text: &str) {
        match self.document.get_element_by_id(id) {
            Some(element) => element.set_text_content(Some(text)),
            None => log::debug!("Element #{} not found", id),
        }
    }
}

impl PageSurface for DomPage {
    fn grid_columns(&self, title: &str, layer: GridLayer) -> Result<usize> {
        let grid = self.grid(title, layer)?;
        let style = self
            .window
            .get_computed_style(&grid)
            .map_err(|e| dom_error("computed style", e))?
            .ok_or_else(|| PlaybackError::ColumnsUnavailable(title.to_string()))?;
        let template = style
            .get_property_value("grid-template-columns")
            .map_err(|e| dom_error("grid-template-columns", e))?;
        column_count(&template).ok_or_else(|| PlaybackError::ColumnsUnavailable(title.to_string()))
    }

    fn has_layer(&self, title: &str, layer: GridLayer) -> bool {
        self.grid(title, layer).is_ok()
    }

    fn set_cell_class(&mut self, title: &str, index: usize, class: &str) -> Result<()> {
        let cell = self.cell(title, GridLayer::Cells, index)?;
        let marker_selector = format!(".{}", self.selectors.marker_class);
        let marker = match cell
            .query_selector(&marker_selector)
            .map_err(|e| dom_error("query marker", e))?
        {
            Some(marker) => marker,
            None => {
                let marker = self.create_div(&self.selectors.marker_class)?;
                cell.append_child(&marker)
                    .map_err(|e| dom_error("append marker", e))?;
                marker
            }
        };
        marker.set_class_name(&format!("{} {}", self.selectors.marker_class, class));
        Ok(())
    }

    fn append_marker(
        &mut self,
        title: &str,
        layer: GridLayer,
        index: usize,
        class: &str,
    ) -> Result<()> {
        let cell = self.cell(title, layer, index)?;
        let marker = self.create_div(&format!("{} {}", self.selectors.step_marker_class, class))?;
        cell.append_child(&marker)
            .map_err(|e| dom_error("append marker", e))?;
        Ok(())
    }

    fn set_status(&mut self, title: &str, text: &str) -> Result<()> {
        let id = self.selectors.status_id(title);
        let status = match self.document.get_element_by_id(&id) {
            Some(status) => status,
            None => {
                let container = self.container(title)?;
                let status = self.create_div(&self.selectors.status_class)?;
                status.set_id(&id);
                container
                    .append_child(&status)
                    .map_err(|e| dom_error("append status", e))?;
                status
            }
        };
        status.set_text_content(Some(text));
        Ok(())
    }

    fn set_playback_label(&mut self, label: &str) {
        self.set_text_by_id(&self.selectors.playback_button_id, label);
    }

    fn set_speed_label(&mut self, speed_ms: u32) {
        self.set_text_by_id(&self.selectors.speed_value_id, &speed_ms.to_string());
    }
}
