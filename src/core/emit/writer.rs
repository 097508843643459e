//! Text builder for the emitted CommonJS module.
//!
//! All statement shapes the packer produces go through here, so the linking
//! logic never concatenates JavaScript by hand.

#[derive(Debug, Default)]
pub struct ModuleWriter {
    out: String,
}

impl ModuleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `'use strict';`
    pub fn use_strict(&mut self) {
        self.out.push_str("'use strict';\n");
    }

    /// `var <symbol> = <init>;`
    pub fn var(&mut self, symbol: &str, init: &str) {
        self.line(format!("var {} = {};", symbol, init));
    }

    /// `var a, b, c;`
    pub fn forward(&mut self, symbols: &[&str]) {
        self.line(format!("var {};", symbols.join(", ")));
    }

    /// `<symbol> = <init>;`
    pub fn assign(&mut self, symbol: &str, init: &str) {
        self.line(format!("{} = {};", symbol, init));
    }

    /// `<symbol>.<name> = <value>;`
    pub fn property(&mut self, symbol: &str, name: &str, value: &str) {
        self.line(format!("{}.{} = {};", symbol, name, value));
    }

    /// `module.exports = <symbol>;`
    pub fn export(&mut self, symbol: &str) {
        self.line(format!("module.exports = {};", symbol));
    }

    /// Append text produced by another writer.
    pub fn append(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, statement: String) {
        self.out.push_str(&statement);
        self.out.push('\n');
    }
}
