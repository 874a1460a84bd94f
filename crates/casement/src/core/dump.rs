//! Debug renderings of the widget tree and the window stack.

use std::io::Write;

use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table, presets::UTF8_FULL};
use termcolor::{Buffer, Color, ColorSpec, WriteColor};

use crate::{
    error::{Error, Result},
    id::WidgetId,
    toolkit::Toolkit,
    tree::WidgetTree,
};

/// Render the subtree under `root` as indented, coloured text.
pub fn dump_tree(tree: &WidgetTree, root: WidgetId) -> Result<String> {
    let mut buffer = Buffer::ansi();
    let mut stack = vec![(root, 0usize)];
    while let Some((id, level)) = stack.pop() {
        let node = tree
            .node(id)
            .ok_or_else(|| Error::Internal("missing node".into()))?;
        let indent = "    ".repeat(level);

        write!(buffer, "{indent}")?;
        buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(buffer, "{}", node.name())?;
        buffer.reset()?;
        write!(buffer, " {id:?} refs={}", node.refs())?;
        if !node.flags().is_empty() {
            buffer.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
            write!(buffer, " {:?}", node.flags())?;
            buffer.reset()?;
        }
        writeln!(buffer)?;

        let r = node.rect();
        buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(buffer, "{indent}  rect:")?;
        buffer.reset()?;
        writeln!(buffer, " {} {} {}x{}", r.tl.x, r.tl.y, r.w, r.h)?;

        for child in node.children().iter().rev() {
            stack.push((*child, level + 1));
        }
    }
    Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
}

/// Render the window stack, topmost first, as a table.
pub fn window_table(tk: &Toolkit) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "window", "app", "rect", "flags", "focus"]);
    let active = tk.screen().active_window();
    for (i, e) in tk.screen().windows().iter().enumerate() {
        let r = tk.tree().geometry(e.id);
        let title = tk
            .tree()
            .get_attr(e.id, "title")
            .map(|v| v.to_string())
            .unwrap_or_default();
        let mut name = Cell::new(format!("{:?} {title}", e.id));
        if active == Some(e.id) {
            name = name.fg(TableColor::Green);
        }
        table.add_row(vec![
            Cell::new(i),
            name,
            Cell::new(tk.tree().app(e.id).map(|a| a.to_string()).unwrap_or_default()),
            Cell::new(format!("{} {} {}x{}", r.tl.x, r.tl.y, r.w, r.h)),
            Cell::new(format!("{:?}", tk.tree().flags(e.id))),
            Cell::new(e.kfocus.map(|f| format!("{f:?}")).unwrap_or_default()),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        canvas::Color as Px,
        config::Config,
        geom::{Expanse, Rect},
        id::AppId,
        testing::MemoryFrameBuffer,
        widgets::{Panel, Window},
    };

    #[test]
    fn tree_dump() -> Result<()> {
        let mut t = WidgetTree::new();
        let w = t.create(AppId(1), Window::new(Px::WHITE));
        t.add_child(w, Panel::new())?;
        let s = dump_tree(&t, w)?;
        assert!(s.contains("window"));
        assert!(s.contains("    \u{1b}"));
        assert!(s.contains("panel"));
        Ok(())
    }

    #[test]
    fn table() -> Result<()> {
        let (_, fb) = MemoryFrameBuffer::create(Expanse::new(100, 100));
        let mut tk = Toolkit::init(Config::default(), Box::new(fb))?;
        let w = tk.create(AppId(3), Window::new(Px::WHITE).with_title("main"));
        tk.place(w, Rect::new(1, 2, 30, 40))?;
        let s = window_table(&tk);
        assert!(s.contains("main"));
        assert!(s.contains("app3"));
        assert!(s.contains("1 2 30x40"));
        Ok(())
    }
}
