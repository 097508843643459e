use anyhow::{Result, anyhow, bail};
use swc_common::{BytePos, FileName, SourceMap};
use swc_ecma_ast::{Script, Stmt};
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax};

const PREFIX: &str = "(";
const SUFFIX: &str = "\n);";

pub struct ParsedExpression {
    /// A script holding exactly one expression statement.
    pub script: Script,
    /// Position of the first byte of the original text.
    pub base: BytePos,
}

impl ParsedExpression {
    /// Byte offset of `pos` into the original, unwrapped text.
    pub fn offset(&self, pos: BytePos) -> Option<usize> {
        pos.0.checked_sub(self.base.0).map(|offset| offset as usize)
    }
}

/// Parse JavaScript text that must form a single expression.
///
/// The text is wrapped in parentheses so anonymous function expressions
/// parse; spans reported through [`ParsedExpression::offset`] point back into
/// the original text.
pub fn parse_expression_source(code: &str, label: &str) -> Result<ParsedExpression> {
    let source_map = SourceMap::default();
    let wrapped = format!("{}{}{}", PREFIX, code, SUFFIX);
    let source_file =
        source_map.new_source_file(FileName::Custom(label.to_string()).into(), wrapped);

    let syntax = Syntax::Es(EsSyntax::default());
    let mut parser = Parser::new(syntax, StringInput::from(&*source_file), None);
    let script = parser
        .parse_script()
        .map_err(|e| anyhow!("Failed to parse {}: {:?}", label, e))?;

    let errors = parser.take_errors();
    if let Some(first) = errors.first() {
        bail!("Failed to parse {}: {:?}", label, first);
    }

    if script.body.len() != 1 || !matches!(script.body[0], Stmt::Expr(_)) {
        bail!("{} is not a single expression", label);
    }

    Ok(ParsedExpression {
        script,
        base: source_file.start_pos + BytePos(PREFIX.len() as u32),
    })
}
