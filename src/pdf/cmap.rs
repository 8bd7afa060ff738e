// src/pdf/cmap.rs
//! Minimal ToUnicode CMap reader: `bfchar` and `bfrange` sections only.

use std::collections::HashMap;

/// Maps a character code to the Unicode text it stands for.
pub type UnicodeMap = HashMap<u32, String>;

pub fn parse_to_unicode(data: &[u8]) -> UnicodeMap {
    let text = String::from_utf8_lossy(data);
    let mut map = UnicodeMap::new();

    for section in sections(&text, "beginbfchar", "endbfchar") {
        let tokens = tokenize(section);
        for pair in tokens.chunks(2) {
            if let [Token::Hex(src), Token::Hex(dst)] = pair {
                if let Some(s) = utf16_text(dst) {
                    map.insert(code_of(src), s);
                }
            }
        }
    }

    for section in sections(&text, "beginbfrange", "endbfrange") {
        let tokens = tokenize(section);
        let mut i = 0;
        while i + 2 < tokens.len() {
            let (Token::Hex(lo), Token::Hex(hi)) = (&tokens[i], &tokens[i + 1]) else {
                i += 1;
                continue;
            };
            let (lo, hi) = (code_of(lo), code_of(hi));
            if hi < lo || hi - lo > 0xFFFF {
                i += 3;
                continue;
            }
            match &tokens[i + 2] {
                Token::Hex(dst) => {
                    // Consecutive codes map to consecutive values; only the last unit increments.
                    for (offset, code) in (lo..=hi).enumerate() {
                        let mut units = utf16_units(dst);
                        if let Some(last) = units.last_mut() {
                            *last = last.wrapping_add(offset as u16);
                        }
                        if let Ok(s) = String::from_utf16(&units) {
                            map.insert(code, s);
                        }
                    }
                }
                Token::Array(values) => {
                    for (code, dst) in (lo..=hi).zip(values) {
                        if let Some(s) = utf16_text(dst) {
                            map.insert(code, s);
                        }
                    }
                }
            }
            i += 3;
        }
    }

    map
}

#[derive(Debug)]
enum Token {
    Hex(Vec<u8>),
    Array(Vec<Vec<u8>>),
}

fn sections<'a>(text: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut remaining = text;
    while let Some(start) = remaining.find(begin) {
        remaining = &remaining[start + begin.len()..];
        match remaining.find(end) {
            Some(stop) => {
                found.push(&remaining[..stop]);
                remaining = &remaining[stop + end.len()..];
            }
            None => break,
        }
    }
    found
}

fn tokenize(section: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = section.chars();
    let mut array: Option<Vec<Vec<u8>>> = None;

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let mut hex = String::new();
                for h in chars.by_ref() {
                    if h == '>' {
                        break;
                    }
                    if h.is_ascii_hexdigit() {
                        hex.push(h);
                    }
                }
                let bytes = hex_bytes(&hex);
                match array.as_mut() {
                    Some(values) => values.push(bytes),
                    None => tokens.push(Token::Hex(bytes)),
                }
            }
            '[' => array = Some(Vec::new()),
            ']' => {
                if let Some(values) = array.take() {
                    tokens.push(Token::Array(values));
                }
            }
            _ => {}
        }
    }
    tokens
}

fn hex_bytes(hex: &str) -> Vec<u8> {
    let mut digits: Vec<u8> = hex.bytes().collect();
    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }
    digits
        .chunks(2)
        .filter_map(|pair| std::str::from_utf8(pair).ok())
        .filter_map(|pair| u8::from_str_radix(pair, 16).ok())
        .collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect()
}

fn utf16_text(bytes: &[u8]) -> Option<String> {
    String::from_utf16(&utf16_units(bytes)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bfchar() {
        let cmap = b"2 beginbfchar\n<0003> <0020>\n<0024><0041>\nendbfchar";
        let map = parse_to_unicode(cmap);
        assert_eq!(map.get(&0x0003).map(String::as_str), Some(" "));
        assert_eq!(map.get(&0x0024).map(String::as_str), Some("A"));
    }

    #[test]
    fn test_parse_bfrange_sequence() {
        let cmap = b"beginbfrange\n<0024> <0026> <0041>\nendbfrange";
        let map = parse_to_unicode(cmap);
        assert_eq!(map.get(&0x0024).map(String::as_str), Some("A"));
        assert_eq!(map.get(&0x0025).map(String::as_str), Some("B"));
        assert_eq!(map.get(&0x0026).map(String::as_str), Some("C"));
    }

    #[test]
    fn test_parse_bfrange_array_and_ligature() {
        let cmap = b"beginbfrange\n<05> <06> [<0066006C> <0041>]\nendbfrange";
        let map = parse_to_unicode(cmap);
        assert_eq!(map.get(&0x05).map(String::as_str), Some("fl"));
        assert_eq!(map.get(&0x06).map(String::as_str), Some("A"));
    }
}
