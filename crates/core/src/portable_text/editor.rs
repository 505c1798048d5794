use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use super::{Block, ListKind, Span, STYLES};

pub const MAX_HISTORY: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("no block at index {0}")]
    OutOfRange(usize),
    #[error("no span at index {span} in block {block}")]
    SpanOutOfRange { block: usize, span: usize },
    #[error("unknown block style `{0}`")]
    UnknownStyle(String),
}

/// One editing step, as the dashboard sends it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EditOp {
    InsertBlock {
        index: usize,
        #[serde(default)]
        text: String,
    },
    RemoveBlock {
        index: usize,
    },
    MoveBlock {
        from: usize,
        to: usize,
    },
    SetText {
        index: usize,
        text: String,
    },
    SetStyle {
        index: usize,
        style: String,
    },
    SetListItem {
        index: usize,
        #[serde(default)]
        kind: Option<ListKind>,
    },
    ToggleMark {
        index: usize,
        span: usize,
        mark: String,
    },
    Undo,
    Redo,
}

/// Block array with whole-snapshot undo/redo.
///
/// `history[cursor]` always equals `blocks`. Each edit drops any redo
/// tail, pushes a snapshot and keeps at most [`MAX_HISTORY`] of them.
#[derive(Debug, Clone)]
pub struct Editor {
    blocks: Vec<Block>,
    history: Vec<Vec<Block>>,
    cursor: usize,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Editor {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            history: vec![blocks.clone()],
            blocks,
            cursor: 0,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        self.blocks = self.history[self.cursor].clone();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        self.blocks = self.history[self.cursor].clone();
        true
    }

    /// Insert an empty paragraph at `index` (clamped to the end) and
    /// return its key.
    pub fn insert_block(&mut self, index: usize, text: &str) -> String {
        let key = new_key();
        let at = index.min(self.blocks.len());
        self.blocks.insert(at, Block::new(key.clone(), text));
        self.commit();
        key
    }

    pub fn remove_block(&mut self, index: usize) -> Result<Block, EditorError> {
        self.check(index)?;
        let removed = self.blocks.remove(index);
        self.commit();
        Ok(removed)
    }

    pub fn move_block(&mut self, from: usize, to: usize) -> Result<(), EditorError> {
        self.check(from)?;
        self.check(to)?;
        if from == to {
            return Ok(());
        }
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        self.commit();
        Ok(())
    }

    /// Replace a block's text with a single unmarked span.
    pub fn set_text(&mut self, index: usize, text: &str) -> Result<(), EditorError> {
        self.check(index)?;
        let block = &mut self.blocks[index];
        let key = block
            .children
            .first()
            .map(|s| s.key.clone())
            .unwrap_or_else(new_key);
        block.children = vec![Span::new(key, text)];
        self.commit();
        Ok(())
    }

    pub fn set_style(&mut self, index: usize, style: &str) -> Result<(), EditorError> {
        self.check(index)?;
        if !STYLES.contains(&style) {
            return Err(EditorError::UnknownStyle(style.to_string()));
        }
        self.blocks[index].style = style.to_string();
        self.commit();
        Ok(())
    }

    /// Turn a block into a list item, or back into a paragraph with `None`.
    pub fn set_list_item(&mut self, index: usize, kind: Option<ListKind>) -> Result<(), EditorError> {
        self.check(index)?;
        let block = &mut self.blocks[index];
        block.list_item = kind;
        block.level = kind.map(|_| 1);
        self.commit();
        Ok(())
    }

    /// Add `mark` to the span's marks, or remove it if already present.
    pub fn toggle_mark(&mut self, index: usize, span: usize, mark: &str) -> Result<(), EditorError> {
        self.check(index)?;
        let target = self.blocks[index]
            .children
            .get_mut(span)
            .ok_or(EditorError::SpanOutOfRange { block: index, span })?;
        if let Some(pos) = target.marks.iter().position(|m| m == mark) {
            target.marks.remove(pos);
        } else {
            target.marks.push(mark.to_string());
        }
        self.commit();
        Ok(())
    }

    /// Run one [`EditOp`]. Undo and redo past either end do nothing.
    pub fn apply(&mut self, op: &EditOp) -> Result<(), EditorError> {
        match op {
            EditOp::InsertBlock { index, text } => {
                self.insert_block(*index, text);
            }
            EditOp::RemoveBlock { index } => {
                self.remove_block(*index)?;
            }
            EditOp::MoveBlock { from, to } => self.move_block(*from, *to)?,
            EditOp::SetText { index, text } => self.set_text(*index, text)?,
            EditOp::SetStyle { index, style } => self.set_style(*index, style)?,
            EditOp::SetListItem { index, kind } => self.set_list_item(*index, *kind)?,
            EditOp::ToggleMark { index, span, mark } => self.toggle_mark(*index, *span, mark)?,
            EditOp::Undo => {
                self.undo();
            }
            EditOp::Redo => {
                self.redo();
            }
        }
        Ok(())
    }

    fn check(&self, index: usize) -> Result<(), EditorError> {
        if index < self.blocks.len() {
            Ok(())
        } else {
            Err(EditorError::OutOfRange(index))
        }
    }

    fn commit(&mut self) {
        self.history.truncate(self.cursor + 1);
        self.history.push(self.blocks.clone());
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
        self.cursor = self.history.len() - 1;
    }
}

fn new_key() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(editor: &Editor) -> Vec<String> {
        editor.blocks().iter().map(Block::text).collect()
    }

    #[test]
    fn undo_redo_walks_snapshots() {
        let mut e = Editor::default();
        e.insert_block(0, "uno");
        e.insert_block(1, "dos");
        e.set_text(0, "UNO").unwrap();
        assert_eq!(texts(&e), vec!["UNO", "dos"]);

        assert!(e.undo());
        assert_eq!(texts(&e), vec!["uno", "dos"]);
        assert!(e.undo());
        assert!(e.undo());
        assert!(e.blocks().is_empty());
        assert!(!e.undo());

        assert!(e.redo());
        assert_eq!(texts(&e), vec!["uno"]);
    }

    #[test]
    fn new_edit_discards_redo_tail() {
        let mut e = Editor::default();
        e.insert_block(0, "a");
        e.insert_block(1, "b");
        e.undo();
        e.insert_block(1, "c");
        assert!(!e.can_redo());
        assert_eq!(texts(&e), vec!["a", "c"]);
    }

    #[test]
    fn history_is_capped() {
        let mut e = Editor::default();
        for i in 0..150 {
            e.insert_block(i, &i.to_string());
        }
        assert_eq!(e.history_len(), MAX_HISTORY);
        let mut undos = 0;
        while e.undo() {
            undos += 1;
        }
        assert_eq!(undos, MAX_HISTORY - 1);
        assert_eq!(e.blocks().len(), 150 - (MAX_HISTORY - 1));
    }

    #[test]
    fn marks_toggle_by_membership() {
        let mut e = Editor::new(vec![Block::new("a", "Hola")]);
        e.toggle_mark(0, 0, "strong").unwrap();
        e.toggle_mark(0, 0, "em").unwrap();
        assert_eq!(e.blocks()[0].children[0].marks, vec!["strong", "em"]);
        e.toggle_mark(0, 0, "strong").unwrap();
        assert_eq!(e.blocks()[0].children[0].marks, vec!["em"]);
        assert_eq!(
            e.toggle_mark(0, 3, "em"),
            Err(EditorError::SpanOutOfRange { block: 0, span: 3 })
        );
    }

    #[test]
    fn move_style_and_list() {
        let mut e = Editor::new(vec![Block::new("a", "a"), Block::new("b", "b"), Block::new("c", "c")]);
        e.move_block(0, 2).unwrap();
        assert_eq!(texts(&e), vec!["b", "c", "a"]);
        e.set_style(0, "h2").unwrap();
        assert_eq!(e.blocks()[0].style, "h2");
        assert_eq!(e.set_style(0, "h9"), Err(EditorError::UnknownStyle("h9".into())));
        e.set_list_item(1, Some(ListKind::Number)).unwrap();
        assert_eq!(e.blocks()[1].level, Some(1));
        assert_eq!(e.remove_block(5), Err(EditorError::OutOfRange(5)));
        assert_eq!(e.remove_block(2).unwrap().text(), "a");
    }

    #[test]
    fn ops_deserialize_from_dashboard_json() {
        let ops: Vec<EditOp> = serde_json::from_value(serde_json::json!([
            {"op": "insertBlock", "index": 0, "text": "Hola"},
            {"op": "setListItem", "index": 0, "kind": "bullet"},
            {"op": "toggleMark", "index": 0, "span": 0, "mark": "strong"},
            {"op": "undo"},
        ]))
        .unwrap();
        assert_eq!(
            ops[1],
            EditOp::SetListItem {
                index: 0,
                kind: Some(ListKind::Bullet)
            }
        );

        let mut editor = Editor::default();
        for op in &ops {
            editor.apply(op).unwrap();
        }
        assert!(editor.blocks()[0].children[0].marks.is_empty());
        assert_eq!(editor.blocks()[0].list_item, Some(ListKind::Bullet));
        assert_eq!(
            editor.apply(&EditOp::SetText {
                index: 3,
                text: "x".into()
            }),
            Err(EditorError::OutOfRange(3))
        );
    }
}
