//! Numeral conversion tables shared by the keyword and title parsers.
//!
//! Covers ASCII Roman numerals (subtractive notation), the Unicode Roman
//! numeral block (`Ⅰ`..`Ⅻ`), and Chinese numerals in both the everyday
//! (一二三) and formal/banker (壹贰叁) forms.

/// Convert an ASCII Roman numeral to an integer.
///
/// Handles subtractive notation (`IV` = 4, `IX` = 9). Returns `None` for
/// strings containing non-Roman characters or for the empty string.
pub fn roman_to_int(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let values: Vec<u32> = s
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            'D' => Some(500),
            'M' => Some(1000),
            _ => None,
        })
        .collect::<Option<Vec<u32>>>()?;

    let mut total = 0u32;
    let mut i = 0;
    while i < values.len() {
        if i + 1 < values.len() && values[i] < values[i + 1] {
            total += values[i + 1] - values[i];
            i += 2;
        } else {
            total += values[i];
            i += 1;
        }
    }
    Some(total)
}

/// Convert a single Unicode Roman numeral character (`Ⅰ`..`Ⅻ`, upper or
/// lower form) to an integer.
pub fn unicode_roman_to_int(c: char) -> Option<u32> {
    let upper = match c {
        'ⅰ'..='ⅻ' => char::from_u32(c as u32 - 0x10)?,
        _ => c,
    };
    match upper {
        'Ⅰ' => Some(1),
        'Ⅱ' => Some(2),
        'Ⅲ' => Some(3),
        'Ⅳ' => Some(4),
        'Ⅴ' => Some(5),
        'Ⅵ' => Some(6),
        'Ⅶ' => Some(7),
        'Ⅷ' => Some(8),
        'Ⅸ' => Some(9),
        'Ⅹ' => Some(10),
        'Ⅺ' => Some(11),
        'Ⅻ' => Some(12),
        _ => None,
    }
}

/// Convert a single Chinese numeral character to an integer.
///
/// Accepts both the everyday form (一二三…十) and the formal form
/// (壹贰叁…拾) used in some release titles.
pub fn chinese_to_int(c: char) -> Option<u32> {
    match c {
        '一' | '壹' => Some(1),
        '二' | '贰' => Some(2),
        '三' | '叁' => Some(3),
        '四' | '肆' => Some(4),
        '五' | '伍' => Some(5),
        '六' | '陆' => Some(6),
        '七' | '柒' => Some(7),
        '八' | '捌' => Some(8),
        '九' | '玖' => Some(9),
        '十' | '拾' => Some(10),
        _ => None,
    }
}

/// Parse a string that is either an Arabic number or a single Chinese
/// numeral character.
pub fn chinese_or_arabic(s: &str) -> Option<u32> {
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    let mut chars = s.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    chinese_to_int(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roman_simple() {
        assert_eq!(roman_to_int("III"), Some(3));
        assert_eq!(roman_to_int("vii"), Some(7));
        assert_eq!(roman_to_int("XII"), Some(12));
    }

    #[test]
    fn roman_subtractive() {
        assert_eq!(roman_to_int("IV"), Some(4));
        assert_eq!(roman_to_int("IX"), Some(9));
        assert_eq!(roman_to_int("XIV"), Some(14));
    }

    #[test]
    fn roman_rejects_garbage() {
        assert_eq!(roman_to_int(""), None);
        assert_eq!(roman_to_int("IIIQ"), None);
    }

    #[test]
    fn unicode_roman_both_cases() {
        assert_eq!(unicode_roman_to_int('Ⅲ'), Some(3));
        assert_eq!(unicode_roman_to_int('ⅲ'), Some(3));
        assert_eq!(unicode_roman_to_int('Ⅻ'), Some(12));
        assert_eq!(unicode_roman_to_int('A'), None);
    }

    #[test]
    fn chinese_everyday_and_formal() {
        assert_eq!(chinese_to_int('二'), Some(2));
        assert_eq!(chinese_to_int('贰'), Some(2));
        assert_eq!(chinese_to_int('拾'), Some(10));
        assert_eq!(chinese_to_int('季'), None);
    }

    #[test]
    fn mixed_parser() {
        assert_eq!(chinese_or_arabic("3"), Some(3));
        assert_eq!(chinese_or_arabic("三"), Some(3));
        assert_eq!(chinese_or_arabic("三三"), None);
    }
}
