// 迷路グリッドのセル番地計算
//
// グリッドの子要素は外周1マスの壁を含めたフラットな並びになっている。
// 迷路内の (row, col) は壁の分だけずらして数える。

use crate::steps::Pos;

/// `(row, col)` をフラットなセル番号に変換する
///
/// `width` は外周の壁を含む列数。負の座標は `None`。
pub fn cell_index(pos: Pos, width: usize) -> Option<usize> {
    let row = usize::try_from(pos[0]).ok()?;
    let col = usize::try_from(pos[1]).ok()?;
    (row + 1).checked_mul(width)?.checked_add(col + 1)
}

/// 列 `col` が外周の壁の内側に収まっているか
pub fn column_fits(col: i64, width: usize) -> bool {
    match usize::try_from(col) {
        Ok(col) => col + 2 < width,
        Err(_) => false,
    }
}

/// `grid-template-columns` の値から列数を数える
///
/// 計算済みスタイルでは `8px 8px 8px` のようにトラックが並ぶ。
/// インラインスタイルのままの `repeat(12, 8px)` も数えられる。
/// `none` や空文字は `None`。
pub fn column_count(template: &str) -> Option<usize> {
    let template = template.trim();
    if template.is_empty() || template == "none" {
        return None;
    }

    let mut count = 0usize;
    let mut rest = template;
    while !rest.is_empty() {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        if let Some(inner) = rest.strip_prefix("repeat(") {
            let close = matching_paren(inner)?;
            let (args, tail) = inner.split_at(close);
            let (times, tracks) = args.split_once(',')?;
            let times: usize = times.trim().parse().ok()?;
            count = times
                .checked_mul(count_tracks(tracks)?)
                .and_then(|n| count.checked_add(n))?;
            rest = &tail[1..];
        } else {
            let end = track_end(rest);
            let (token, tail) = rest.split_at(end);
            // 行名 [name] はトラックではない
            if !token.starts_with('[') {
                count = count.checked_add(1)?;
            }
            rest = tail;
        }
    }

    (count > 0).then_some(count)
}

fn count_tracks(tracks: &str) -> Option<usize> {
    let mut count = 0usize;
    let mut rest = tracks.trim();
    while !rest.is_empty() {
        let end = track_end(rest);
        let (token, tail) = rest.split_at(end);
        if !token.starts_with('[') {
            count += 1;
        }
        rest = tail.trim_start();
    }
    (count > 0).then_some(count)
}

/// 括弧の深さを考慮して、空白で区切られた次のトークンの終わりを返す
fn track_end(s: &str) -> usize {
    let mut depth = 0i32;
    let mut in_name = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            '[' => in_name = true,
            ']' => in_name = false,
            c if c.is_whitespace() && depth <= 0 && !in_name => return i,
            _ => {}
        }
    }
    s.len()
}

fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 1i32;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// CSS の属性セレクタに埋め込む文字列をエスケープする
pub fn css_string_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\a "),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_index_origin() {
        assert_eq!(cell_index([0, 0], 7), Some(8));
        assert_eq!(cell_index([0, 0], 12), Some(13));
    }

    #[test]
    fn test_cell_index_formula() {
        for w in [3usize, 5, 12] {
            for r in 0..4i64 {
                for c in 0..(w as i64 - 2) {
                    let expected = (r as usize + 1) * w + (c as usize + 1);
                    assert_eq!(cell_index([r, c], w), Some(expected));
                }
            }
        }
    }

    #[test]
    fn test_cell_index_negative() {
        assert_eq!(cell_index([-1, 0], 5), None);
        assert_eq!(cell_index([0, -3], 5), None);
    }

    #[test]
    fn test_column_fits() {
        assert!(column_fits(0, 5));
        assert!(column_fits(2, 5));
        assert!(!column_fits(3, 5));
        assert!(!column_fits(-1, 5));
    }

    #[test]
    fn test_column_count_resolved_tracks() {
        assert_eq!(column_count("8px 8px 8px"), Some(3));
        assert_eq!(column_count("  8px   8px "), Some(2));
        assert_eq!(column_count("minmax(8px, 1fr) 8px"), Some(2));
    }

    #[test]
    fn test_column_count_repeat() {
        assert_eq!(column_count("repeat(12, 8px)"), Some(12));
        assert_eq!(column_count("repeat(3, 8px 4px) 10px"), Some(7));
    }

    #[test]
    fn test_column_count_line_names() {
        assert_eq!(column_count("[a] 8px [b c] 8px"), Some(2));
    }

    #[test]
    fn test_column_count_empty() {
        assert_eq!(column_count(""), None);
        assert_eq!(column_count("none"), None);
        assert_eq!(column_count("repeat(x, 8px)"), None);
    }

    #[test]
    fn test_column_count_overflow() {
        assert_eq!(column_count("repeat(18446744073709551615, 8px 8px)"), None);
        assert_eq!(
            column_count("repeat(18446744073709551615, 8px) repeat(1, 8px)"),
            None
        );
    }

    #[test]
    fn test_css_string_escape() {
        assert_eq!(css_string_escape(r#"A* "fast""#), r#"A* \"fast\""#);
        assert_eq!(css_string_escape(r"a\b"), r"a\\b");
        assert_eq!(css_string_escape("JPS+寻路结果"), "JPS+寻路结果");
    }
}
