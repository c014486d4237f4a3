/// Parser for the contents of scanned blocks: parameter declarations and
/// component references.
use std::fmt;

use luminary_types::{Param, ParamSize};

use crate::scanner::{BlockKind, ScanError, Scanner, SourceLine, TextBlock};

#[derive(Debug, Clone)]
pub struct ParseError {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<ScanError> for ParseError {
    fn from(e: ScanError) -> Self {
        Self {
            line: e.line,
            col: e.col,
            message: e.message,
        }
    }
}

const COMPONENT_REF: &str = "ENT_COMPONENT";
const TAGS_OPEN: &str = "[TAGS=";
const TAGS_CLOSE: char = ']';

/// A block with its lines parsed.
#[derive(Debug, Clone)]
pub struct ParsedBlock {
    pub kind: BlockKind,
    pub name: String,
    pub line: usize,
    pub params: Vec<Param>,
    /// Names from `ENT_COMPONENT` lines, in order.
    pub component_refs: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

pub struct Parser;

impl Parser {
    /// Scan and parse one source file.
    pub fn parse(input: &str) -> Result<Vec<ParsedBlock>, ParseError> {
        let blocks = Scanner::new(input).scan()?;
        blocks.into_iter().map(Self::parse_block).collect()
    }

    fn parse_block(block: TextBlock) -> Result<ParsedBlock, ParseError> {
        let mut parsed = ParsedBlock {
            kind: block.kind,
            name: block.name,
            line: block.line,
            params: Vec::new(),
            component_refs: Vec::new(),
        };

        for line in &block.lines {
            if line.words[0].eq_ignore_ascii_case(COMPONENT_REF) {
                let Some(name) = line.words.get(1) else {
                    return Err(ParseError {
                        line: line.line,
                        col: 1,
                        message: format!("{COMPONENT_REF} without a component name"),
                    });
                };
                parsed.component_refs.push(name.clone());
            } else if let Some(param) = parse_param(line)? {
                parsed.params.push(param);
            }
        }

        Ok(parsed)
    }
}

/// Parse `<name> rs.b|rs.w|rs.l [count] [TAGS=a,b]`. Lines that are not
/// parameter declarations yield `None`.
fn parse_param(line: &SourceLine) -> Result<Option<Param>, ParseError> {
    let (Some(name), Some(directive)) = (line.words.first(), line.words.get(1)) else {
        return Ok(None);
    };
    let Some(size) = ParamSize::from_rs_directive(directive) else {
        return Ok(None);
    };

    let mut param = Param::new(name.clone(), size, Param::DEFAULT_VALUE);
    param.tags = parse_tags(line)?;
    Ok(Some(param))
}

fn parse_tags(line: &SourceLine) -> Result<Vec<String>, ParseError> {
    let upper = line.text.to_ascii_uppercase();
    let Some(start) = upper.find(TAGS_OPEN) else {
        return Ok(Vec::new());
    };
    let body = &line.text[start + TAGS_OPEN.len()..];
    let Some(end) = body.find(TAGS_CLOSE) else {
        return Err(ParseError {
            line: line.line,
            col: start + 1,
            message: format!("unclosed tag block, expected '{TAGS_CLOSE}'"),
        });
    };

    Ok(body[..end]
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect())
}
