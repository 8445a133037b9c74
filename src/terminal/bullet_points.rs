const INDENT_SIZE: usize = 2;

pub struct BulletPointPrinter<W: LineWriter + Clone = StdoutLineWriter> {
    writer: W,
    nesting: usize,
}

impl<W: LineWriter + Clone> BulletPointPrinter<W> {
    pub fn with_writer(writer: W) -> Self {
        Self { writer, nesting: 0 }
    }

    pub fn print_item(&self, message: impl std::fmt::Display) {
        let indent = " ".repeat(self.nesting * INDENT_SIZE);
        self.writer.write_line(&format!("{}• {}", indent, message));
    }

    /// Prints `title` and the items one level below it, or `empty` if there are none.
    pub fn print_list<T: std::fmt::Display>(
        &self,
        title: impl std::fmt::Display,
        items: impl IntoIterator<Item = T>,
        empty: impl std::fmt::Display,
    ) {
        self.print_item(title);
        let nested = self.indent();
        let mut any = false;
        for item in items {
            nested.print_item(item);
            any = true;
        }
        if !any {
            nested.print_item(empty);
        }
    }

    pub fn indent(&self) -> Self {
        Self {
            writer: self.writer.clone(),
            nesting: self.nesting + 1,
        }
    }
}

impl BulletPointPrinter<StdoutLineWriter> {
    pub fn new() -> Self {
        Self::with_writer(StdoutLineWriter)
    }
}

impl Default for BulletPointPrinter<StdoutLineWriter> {
    fn default() -> Self {
        Self::new()
    }
}

pub trait LineWriter {
    fn write_line(&self, line: &str);
}

#[derive(Clone, Copy)]
pub struct StdoutLineWriter;
impl LineWriter for StdoutLineWriter {
    fn write_line(&self, line: &str) {
        println!("{}", line);
    }
}
