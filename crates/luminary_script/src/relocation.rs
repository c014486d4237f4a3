//! Symbol dump parsing.
//!
//! Reads the text output of `objdump -t -r -C` for a compiled script unit.
//! Relocation lines have the form
//!
//! ```text
//! line      := address ws kind ws symbol
//! address   := hex digits, optional 0x
//! kind      := any token containing R_68K_GOT
//! symbol    := qualified [ '(' params ')' ... ] [ ('+' | '-') addend ]
//! qualified := segment ( '::' segment )*
//! ```
//!
//! `::` and `(` only count outside template brackets. The last segment is
//! the routine name and everything before it the scope.

use std::collections::HashSet;

use luminary_types::tags::SCRIPT_GLOBAL_TAG;
use luminary_types::{Entity, ScriptAddressMap, ScriptRelocation, find_tag_value};
use tracing::{debug, info, warn};

use crate::error::LinkError;
use crate::got::GlobalOffsetTable;

/// Symbol the compiler uses for the table base.
pub const GOT_SYMBOL: &str = "_GLOBAL_OFFSET_TABLE_";

const GOT_RELOCATION_KIND: &str = "R_68K_GOT";

fn parse_hex(text: &str) -> Option<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).ok()
}

/// Split a demangled symbol into `(scope, name)`. `None` if the symbol does
/// not follow the grammar.
fn split_symbol(symbol: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut end = symbol.len();
    let mut separator = None;
    let bytes = symbol.as_bytes();

    for (i, c) in symbol.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            '(' if depth == 0 => {
                end = i;
                break;
            }
            '+' | '-' if depth == 0 && i > 0 => {
                end = i;
                break;
            }
            ':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => separator = Some(i),
            c if c.is_whitespace() && depth == 0 => return None,
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }

    let qualified = &symbol[..end];
    match separator {
        Some(at) if at < end => {
            let (scope, name) = (&qualified[..at], &qualified[at + 2..]);
            let valid = !scope.is_empty()
                && !scope.ends_with(':')
                && !name.is_empty()
                && !name.contains(':');
            valid.then_some((scope, name))
        }
        _ => (!qualified.is_empty() && !qualified.contains(':')).then_some(("", qualified)),
    }
}

fn parse_line(line: &str) -> Option<(u32, &str)> {
    let (address, rest) = line.trim().split_once(char::is_whitespace)?;
    let (kind, symbol) = rest.trim_start().split_once(char::is_whitespace)?;
    if !kind.contains(GOT_RELOCATION_KIND) {
        return None;
    }
    Some((parse_hex(address)?, symbol.trim()))
}

/// Every GOT relocation in `dump`, in order, matched against `got`.
///
/// A line mentioning a GOT relocation that does not parse is an error.
/// Relocations that match no table entry get `table_index: None`.
pub fn parse_relocation_lines(
    dump: &str,
    got: &GlobalOffsetTable,
) -> Result<Vec<ScriptRelocation>, LinkError> {
    let mut relocations = Vec::new();

    for (index, line) in dump.lines().enumerate() {
        if !line.contains(GOT_RELOCATION_KIND) {
            continue;
        }
        let malformed = || LinkError::MalformedRelocation {
            line: index + 1,
            text: line.trim().to_string(),
        };

        let (address, symbol) = parse_line(line).ok_or_else(malformed)?;
        let (scope, name) = split_symbol(symbol).ok_or_else(malformed)?;
        let table_index = if scope.is_empty() {
            None
        } else {
            got.find(scope, name)
        };

        relocations.push(ScriptRelocation {
            address,
            scope: scope.to_string(),
            name: name.to_string(),
            table_index,
        });
    }

    Ok(relocations)
}

/// Whether `relocations` starts with the table base, as every valid unit
/// that references the table must.
#[must_use]
pub fn starts_with_got_base(relocations: &[ScriptRelocation]) -> bool {
    relocations
        .first()
        .is_some_and(|r| r.scope.is_empty() && r.name == GOT_SYMBOL)
}

/// The relocation table for one unit. A table whose first entry is not the
/// table base is discarded whole and an empty table returned.
pub fn parse_relocations(
    dump: &str,
    got: &GlobalOffsetTable,
) -> Result<Vec<ScriptRelocation>, LinkError> {
    let relocations = parse_relocation_lines(dump, got)?;
    if !starts_with_got_base(&relocations) {
        if let Some(first) = relocations.first() {
            warn!(first = %first.name, count = relocations.len(), "relocation table rejected");
        }
        return Ok(Vec::new());
    }
    info!(count = relocations.len(), "relocations parsed");
    Ok(relocations)
}

fn symbol_address(line: &str) -> Option<u32> {
    line.split_whitespace().next().and_then(parse_hex)
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `pattern` occurs in `line` as a whole qualified identifier.
fn contains_symbol(line: &str, pattern: &str) -> bool {
    line.match_indices(pattern).any(|(at, _)| {
        let starts_clean = line[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !(is_symbol_char(c) || c == ':'));
        let ends_clean = line[at + pattern.len()..]
            .chars()
            .next()
            .is_none_or(|c| !is_symbol_char(c));
        starts_clean && ends_clean
    })
}

/// Offset of routine `scope::name` in the symbol table.
#[must_use]
pub fn find_function_offset(dump: &str, scope: &str, name: &str) -> Option<u32> {
    let pattern = format!("{scope}::{name}");
    dump.lines()
        .filter(|line| !line.contains(GOT_RELOCATION_KIND))
        .filter(|line| contains_symbol(line, &pattern))
        .find_map(symbol_address)
}

/// Offset of the generated `static const <type>&` or `static const <type>*`
/// accessor for a script global.
#[must_use]
pub fn find_global_var_offset(dump: &str, type_name: &str) -> Option<u32> {
    let by_ref = format!("static const {type_name}&");
    let by_ptr = format!("static const {type_name}*");
    dump.lines()
        .filter(|line| !line.contains(GOT_RELOCATION_KIND))
        .filter(|line| line.contains(&by_ref) || line.contains(&by_ptr))
        .find_map(symbol_address)
}

/// Routine and global addresses for every entity type in `entities`, looked
/// up in one unit's symbol dump.
#[must_use]
pub fn collect_addresses(dump: &str, entities: &[Entity]) -> ScriptAddressMap {
    let mut map = ScriptAddressMap::new();
    let mut seen = HashSet::new();

    for entity in entities {
        if !seen.insert(entity.type_name.as_str()) {
            continue;
        }

        for func in &entity.script_funcs {
            match find_function_offset(dump, &func.scope, &func.name) {
                Some(address) => map.insert(&entity.type_name, &func.name, address),
                None => debug!(scope = %func.scope, routine = %func.name, "routine not in symbol table"),
            }
        }

        let globals = entity
            .spawn_blocks()
            .flat_map(|block| &block.params)
            .filter_map(|param| find_tag_value(&param.tags, SCRIPT_GLOBAL_TAG));
        for global in globals {
            match find_global_var_offset(dump, global) {
                Some(address) => map.insert(&entity.type_name, global, address),
                None => debug!(global, "global not in symbol table"),
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use luminary_types::{Component, Param, ParamSize, ScriptFunc};

    use super::*;

    const DUMP: &str = "\
script.o:     file format elf32-m68k

SYMBOL TABLE:
00000000 l    df *ABS*\t00000000 EEnemy.cpp
00000000 g     F .text\t0000001c EEnemy::OnStart(Engine const&, Scene const&)
0000001c g     F .text\t00000030 EEnemy::OnUpdate(Engine const&, Scene const&)
0000004c g     F .text\t00000010 EEnemy::OnUpdateFast()
0000005c g     O .text\t00000004 static const Score& g_score
00000000         *UND*\t00000000 _GLOBAL_OFFSET_TABLE_

RELOCATION RECORDS FOR [.text]:
OFFSET   TYPE              VALUE
00000010 R_68K_GOT16O      _GLOBAL_OFFSET_TABLE_
00000020 R_68K_GOT16O      Foo::Tick(Engine const&, Scene const&)
00000024 R_68K_GOT16O      Bar::Tick()+0x00000002
00000028 R_68K_GOT16O      Baz<int, ns::Thing>::Run(short)
0000002c R_68K_GOT16O      Foo::Missing()
";

    fn func(scope: &str, name: &str) -> ScriptFunc {
        ScriptFunc {
            name: name.to_string(),
            scope: scope.to_string(),
            return_type: "void".to_string(),
            routine: format!("{scope}_{name}"),
            params: Vec::new(),
            table_offset: None,
        }
    }

    fn table() -> GlobalOffsetTable {
        let mut foo = Entity::new("Foo", 1);
        foo.script_funcs = vec![func("Foo", "Init"), func("Foo", "Tick")];
        let mut bar = Component::new("Bar");
        bar.script_funcs = vec![func("Bar", "Tick"), func("Baz<int, ns::Thing>", "Run")];
        GlobalOffsetTable::build(&[foo], &[bar])
    }

    #[test]
    fn test_parse_relocations() {
        let relocations = parse_relocations(DUMP, &table()).unwrap();
        let parsed: Vec<_> = relocations
            .iter()
            .map(|r| (r.address, r.scope.as_str(), r.name.as_str(), r.table_index))
            .collect();
        assert_eq!(
            parsed,
            vec![
                (0x10, "", GOT_SYMBOL, None),
                (0x20, "Foo", "Tick", Some(1)),
                (0x24, "Bar", "Tick", Some(2)),
                (0x28, "Baz<int, ns::Thing>", "Run", Some(3)),
                (0x2C, "Foo", "Missing", None),
            ]
        );
    }

    #[test]
    fn test_first_relocation_must_be_got_base() {
        let dump = "\
00000020 R_68K_GOT16O      Foo::Tick()
00000010 R_68K_GOT16O      _GLOBAL_OFFSET_TABLE_
";
        assert_eq!(parse_relocation_lines(dump, &table()).unwrap().len(), 2);
        assert!(parse_relocations(dump, &table()).unwrap().is_empty());
    }

    #[test]
    fn test_no_relocations() {
        assert!(parse_relocations("SYMBOL TABLE:\n", &table()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let dump = "\
00000010 R_68K_GOT16O      _GLOBAL_OFFSET_TABLE_
zz000020 R_68K_GOT16O      Foo::Tick()
";
        let err = parse_relocations(dump, &table()).unwrap_err();
        assert!(matches!(err, LinkError::MalformedRelocation { line: 2, .. }));

        for bad in [
            "00000020 R_68K_GOT16O",
            "00000020 R_68K_GOT16O      Foo<int::Tick()",
            "00000020 R_68K_GOT16O      ::Tick()",
            "00000020 R_68K_GOT16O      Foo:::Tick()",
        ] {
            assert!(
                parse_relocation_lines(bad, &table()).is_err(),
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn test_scope_match_is_case_sensitive() {
        let dump = "\
00000010 R_68K_GOT16O      _GLOBAL_OFFSET_TABLE_
00000020 R_68K_GOT16O      foo::Tick()
";
        let relocations = parse_relocations(dump, &table()).unwrap();
        assert_eq!(relocations[1].table_index, None);
    }

    #[test]
    fn test_find_function_offset() {
        assert_eq!(find_function_offset(DUMP, "EEnemy", "OnUpdate"), Some(0x1C));
        assert_eq!(find_function_offset(DUMP, "EEnemy", "OnUpdateFast"), Some(0x4C));
        // Relocation lines are never symbol definitions.
        assert_eq!(find_function_offset(DUMP, "Foo", "Tick"), None);
    }

    #[test]
    fn test_find_function_offset_ignores_longer_scopes() {
        let dump = "\
00000100 g     F .text\t00000010 BossEEnemy::OnHit()
00000180 g     F .text\t00000010 game::EEnemy::OnHit()
00000200 g     F .text\t00000010 EEnemy::OnHit()
";
        assert_eq!(find_function_offset(dump, "EEnemy", "OnHit"), Some(0x200));
        assert_eq!(find_function_offset(dump, "BossEEnemy", "OnHit"), Some(0x100));
    }

    #[test]
    fn test_find_global_var_offset() {
        assert_eq!(find_global_var_offset(DUMP, "Score"), Some(0x5C));
        assert_eq!(find_global_var_offset(DUMP, "Health"), None);
    }

    #[test]
    fn test_collect_addresses() {
        let mut enemy = Entity::new("EEnemy", 1);
        enemy.script_funcs = vec![func("EEnemy", "OnStart"), func("EEnemy", "OnShutdown")];
        let mut score = Param::new("SDScore", ParamSize::Long, "0");
        score.tags.push("SCRIPTGLOBAL=Score".to_string());
        enemy.spawn_data.params.push(score);

        let map = collect_addresses(DUMP, &[enemy.clone(), enemy]);
        assert_eq!(map.find("EEnemy", "OnStart"), Some(0));
        assert_eq!(map.find("EEnemy", "OnShutdown"), None);
        assert_eq!(map.find("EEnemy", "Score"), Some(0x5C));
    }
}
