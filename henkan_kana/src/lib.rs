//! `henkan_kana`：假名相关的纯字符工具（无依赖、无 I/O）。
//!
//! 提供三类能力：
//! - **罗马字 → 平假名**：`romaji_to_hiragana`（最长匹配 + 促音/拨音规则）
//! - **平假名 → 片假名**：`hiragana_to_katakana`（码点平移）
//! - **拍切分**：`morae`（把平假名读音切成拍；拗音并入前一拍）

/// 罗马字 → 平假名对照表。
///
/// 注意顺序无关：匹配时总是在全表里取**最长前缀**，
/// 所以 `kya` 不会被 `k`+`ya` 抢先。
const ROMAJI_TABLE: &[(&str, &str)] = &[
    // 元音
    ("a", "あ"), ("i", "い"), ("u", "う"), ("e", "え"), ("o", "お"),
    // か行
    ("ka", "か"), ("ki", "き"), ("ku", "く"), ("ke", "け"), ("ko", "こ"),
    ("kya", "きゃ"), ("kyu", "きゅ"), ("kyo", "きょ"),
    ("ga", "が"), ("gi", "ぎ"), ("gu", "ぐ"), ("ge", "げ"), ("go", "ご"),
    ("gya", "ぎゃ"), ("gyu", "ぎゅ"), ("gyo", "ぎょ"),
    // さ行
    ("sa", "さ"), ("si", "し"), ("su", "す"), ("se", "せ"), ("so", "そ"),
    ("sha", "しゃ"), ("shi", "し"), ("shu", "しゅ"), ("sho", "しょ"),
    ("sya", "しゃ"), ("syu", "しゅ"), ("syo", "しょ"),
    ("za", "ざ"), ("zi", "じ"), ("zu", "ず"), ("ze", "ぜ"), ("zo", "ぞ"),
    ("ja", "じゃ"), ("ji", "じ"), ("ju", "じゅ"), ("jo", "じょ"),
    ("jya", "じゃ"), ("jyu", "じゅ"), ("jyo", "じょ"),
    // た行
    ("ta", "た"), ("ti", "ち"), ("tu", "つ"), ("te", "て"), ("to", "と"),
    ("cha", "ちゃ"), ("chi", "ち"), ("chu", "ちゅ"), ("cho", "ちょ"),
    ("tya", "ちゃ"), ("tyu", "ちゅ"), ("tyo", "ちょ"),
    ("tsu", "つ"),
    ("da", "だ"), ("di", "ぢ"), ("du", "づ"), ("de", "で"), ("do", "ど"),
    // な行
    ("na", "な"), ("ni", "に"), ("nu", "ぬ"), ("ne", "ね"), ("no", "の"),
    ("nya", "にゃ"), ("nyu", "にゅ"), ("nyo", "にょ"),
    // は行
    ("ha", "は"), ("hi", "ひ"), ("hu", "ふ"), ("he", "へ"), ("ho", "ほ"),
    ("fu", "ふ"),
    ("hya", "ひゃ"), ("hyu", "ひゅ"), ("hyo", "ひょ"),
    ("ba", "ば"), ("bi", "び"), ("bu", "ぶ"), ("be", "べ"), ("bo", "ぼ"),
    ("bya", "びゃ"), ("byu", "びゅ"), ("byo", "びょ"),
    ("pa", "ぱ"), ("pi", "ぴ"), ("pu", "ぷ"), ("pe", "ぺ"), ("po", "ぽ"),
    ("pya", "ぴゃ"), ("pyu", "ぴゅ"), ("pyo", "ぴょ"),
    // ま行
    ("ma", "ま"), ("mi", "み"), ("mu", "む"), ("me", "め"), ("mo", "も"),
    ("mya", "みゃ"), ("myu", "みゅ"), ("myo", "みょ"),
    // や行
    ("ya", "や"), ("yu", "ゆ"), ("yo", "よ"),
    // ら行
    ("ra", "ら"), ("ri", "り"), ("ru", "る"), ("re", "れ"), ("ro", "ろ"),
    ("rya", "りゃ"), ("ryu", "りゅ"), ("ryo", "りょ"),
    // わ行
    ("wa", "わ"), ("wo", "を"),
    // 长音符
    ("-", "ー"),
];

/// 罗马字 → 平假名（尽力转换）。
///
/// 规则：
/// - 全表最长前缀匹配
/// - 双写辅音（非 `n`）→ 促音 `っ`
/// - `nn` / `n'` → `ん`；`n` 后面不是元音/`y` 时也视为 `ん`
/// - 已是平假名的字符原样保留；无法识别的字符也原样保留
pub fn romaji_to_hiragana(input: &str) -> String {
    let input = input.to_ascii_lowercase();
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if is_hiragana_char(c) {
            out.push(c);
            i += 1;
            continue;
        }
        // 促音：双写辅音（kk/tt/pp/ss 等，n 除外）
        if c.is_ascii_alphabetic()
            && c != 'n'
            && !is_vowel(c)
            && chars.get(i + 1) == Some(&c)
        {
            out.push('っ');
            i += 1;
            continue;
        }
        // 拨音：nn / n' / n+辅音 / 行末 n
        if c == 'n' {
            match chars.get(i + 1) {
                Some('n') => {
                    out.push('ん');
                    i += 2;
                    continue;
                }
                Some('\'') => {
                    out.push('ん');
                    i += 2;
                    continue;
                }
                Some(&next) if !is_vowel(next) && next != 'y' => {
                    out.push('ん');
                    i += 1;
                    continue;
                }
                None => {
                    out.push('ん');
                    i += 1;
                    continue;
                }
                _ => {}
            }
        }
        // 最长前缀匹配
        let rest: String = chars[i..].iter().collect();
        let mut best: Option<(&str, &str)> = None;
        for &(key, kana) in ROMAJI_TABLE {
            if rest.starts_with(key) {
                if best.is_none_or(|(b, _)| key.len() > b.len()) {
                    best = Some((key, kana));
                }
            }
        }
        match best {
            Some((key, kana)) => {
                out.push_str(kana);
                i += key.chars().count();
            }
            None => {
                // 无法识别：原样保留（上层可据此判断输入不合法）
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'i' | 'u' | 'e' | 'o')
}

/// 单个字符是否平假名（含 `ー` 与 `っ`）。
pub fn is_hiragana_char(c: char) -> bool {
    ('\u{3041}'..='\u{3096}').contains(&c) || c == 'ー'
}

/// 整串是否平假名（空串视为 false）。
pub fn is_hiragana(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_hiragana_char)
}

/// 平假名 → 片假名：ぁ(U+3041)..ゖ(U+3096) 整体平移 0x60，其余原样。
pub fn hiragana_to_katakana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if ('\u{3041}'..='\u{3096}').contains(&c) {
                char::from_u32(c as u32 + 0x60).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// 拗音小假名（并入前一拍）。
fn is_small_kana(c: char) -> bool {
    matches!(c, 'ゃ' | 'ゅ' | 'ょ' | 'ぁ' | 'ぃ' | 'ぅ' | 'ぇ' | 'ぉ' | 'ゎ')
}

/// 把平假名读音切成**拍**（mora）。
///
/// - 拗音小假名并入前一拍（きょ → 一拍）
/// - 长音 `ー` 并入前一拍
/// - `っ`、`ん` 各自成拍
/// - 非平假名输入返回空 Vec（调用方据此放弃切分）
pub fn morae(reading: &str) -> Vec<String> {
    if !is_hiragana(reading) {
        return Vec::new();
    }
    let mut out: Vec<String> = Vec::new();
    for c in reading.chars() {
        match out.last_mut() {
            Some(m) if is_small_kana(c) || c == 'ー' => m.push(c),
            _ => out.push(c.to_string()),
        }
    }
    out
}
