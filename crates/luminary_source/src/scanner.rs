//! Line scanner for annotated engine source.
//!
//! Splits a file into named text blocks delimited by paired begin/end
//! markers. Comment lines and macro definitions are skipped.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Entity,
    StaticEntity,
    Component,
    EntitySpawnData,
    ComponentSpawnData,
}

const BLOCK_KINDS: [BlockKind; 5] = [
    BlockKind::EntitySpawnData,
    BlockKind::ComponentSpawnData,
    BlockKind::StaticEntity,
    BlockKind::Entity,
    BlockKind::Component,
];

const MACRO_START: &str = "macro";
const MACRO_END: &str = "endm";
const COMMENT: char = ';';

impl BlockKind {
    pub fn begin_marker(self) -> &'static str {
        match self {
            BlockKind::Entity => "ENTITY_BEGIN",
            BlockKind::StaticEntity => "STATIC_ENTITY_BEGIN",
            BlockKind::Component => "ENTITY_COMPONENT_BEGIN",
            BlockKind::EntitySpawnData => "ENTITY_SPAWN_DATA_BEGIN",
            BlockKind::ComponentSpawnData => "COMPONENT_SPAWN_DATA_BEGIN",
        }
    }

    pub fn end_marker(self) -> &'static str {
        match self {
            BlockKind::Entity => "ENTITY_END",
            BlockKind::StaticEntity => "STATIC_ENTITY_END",
            BlockKind::Component => "ENTITY_COMPONENT_END",
            BlockKind::EntitySpawnData => "ENTITY_SPAWN_DATA_END",
            BlockKind::ComponentSpawnData => "COMPONENT_SPAWN_DATA_END",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.begin_marker())
    }
}

/// One non-comment source line inside a block.
#[derive(Debug, Clone)]
pub struct SourceLine {
    pub line: usize,
    /// The line text with any trailing `;` comment removed.
    pub text: String,
    pub words: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub name: String,
    /// Line of the begin marker.
    pub line: usize,
    pub lines: Vec<SourceLine>,
}

#[derive(Debug, Clone)]
pub struct ScanError {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for ScanError {}

pub struct Scanner<'a> {
    input: &'a str,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    pub fn scan(&self) -> Result<Vec<TextBlock>, ScanError> {
        let mut blocks = Vec::new();
        let mut current: Option<TextBlock> = None;
        let mut in_macro = false;

        for (idx, raw) in self.input.lines().enumerate() {
            let line = idx + 1;
            let text = strip_comment(raw);
            let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
            if words.is_empty() {
                continue;
            }

            // Macro bodies mention the block markers themselves; skip them whole.
            if in_macro {
                if contains_token(&words, MACRO_END).is_some() {
                    in_macro = false;
                }
                continue;
            }
            if contains_token(&words, MACRO_START).is_some() {
                in_macro = true;
                continue;
            }

            if let Some(block) = current.as_mut() {
                if contains_token(&words, block.kind.end_marker()).is_some() {
                    if let Some(done) = current.take() {
                        blocks.push(done);
                    }
                } else {
                    block.lines.push(SourceLine {
                        line,
                        text: text.to_string(),
                        words,
                    });
                }
                continue;
            }

            for kind in BLOCK_KINDS {
                if let Some(pos) = contains_token(&words, kind.begin_marker()) {
                    let Some(name) = words.get(pos + 1) else {
                        return Err(ScanError {
                            line,
                            col: column_of(raw, kind.begin_marker()),
                            message: format!("{kind} without a name"),
                        });
                    };
                    current = Some(TextBlock {
                        kind,
                        name: name.clone(),
                        line,
                        lines: Vec::new(),
                    });
                    break;
                }
            }
        }

        if let Some(block) = current {
            return Err(ScanError {
                line: block.line,
                col: 1,
                message: format!(
                    "{} '{}' is missing {}",
                    block.kind,
                    block.name,
                    block.kind.end_marker()
                ),
            });
        }

        Ok(blocks)
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn contains_token(words: &[String], token: &str) -> Option<usize> {
    words.iter().position(|w| w.eq_ignore_ascii_case(token))
}

fn column_of(raw: &str, token: &str) -> usize {
    raw.to_ascii_uppercase()
        .find(&token.to_ascii_uppercase())
        .map(|p| p + 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_blocks() {
        let input = "\
ENTITY_BEGIN EPlayer
Health rs.w 1
ENTITY_END

ENTITY_COMPONENT_BEGIN ECSprite
SDSprite_Sheet rs.l 1
ENTITY_COMPONENT_END
";
        let blocks = Scanner::new(input).scan().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Entity);
        assert_eq!(blocks[0].name, "EPlayer");
        assert_eq!(blocks[0].lines.len(), 1);
        assert_eq!(blocks[0].lines[0].line, 2);
        assert_eq!(blocks[1].kind, BlockKind::Component);
    }

    #[test]
    fn test_comments_and_macros_skipped() {
        let input = "\
; ENTITY_BEGIN Commented
ENTITY_BEGIN: macro name
    ENTITY_END
    endm
STATIC_ENTITY_BEGIN ELamp ; trailing
Brightness rs.b 1 ; how bright
STATIC_ENTITY_END
";
        let blocks = Scanner::new(input).scan().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::StaticEntity);
        assert_eq!(blocks[0].name, "ELamp");
        assert_eq!(blocks[0].lines[0].words, vec!["Brightness", "rs.b", "1"]);
    }

    #[test]
    fn test_spawn_data_markers_not_confused_with_entity() {
        let input = "\
ENTITY_SPAWN_DATA_BEGIN EPlayer
Speed rs.w 1
ENTITY_SPAWN_DATA_END
";
        let blocks = Scanner::new(input).scan().unwrap();
        assert_eq!(blocks[0].kind, BlockKind::EntitySpawnData);
    }

    #[test]
    fn test_unterminated_block() {
        let input = "ENTITY_BEGIN EPlayer\nHealth rs.w 1\n";
        let err = Scanner::new(input).scan().unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("ENTITY_END"));
    }

    #[test]
    fn test_missing_name() {
        let input = "  ENTITY_BEGIN\n";
        let err = Scanner::new(input).scan().unwrap_err();
        assert_eq!((err.line, err.col), (1, 3));
    }
}
