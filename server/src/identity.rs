//! Per-session identity allocation
//!
//! Every player is drawn as a single symbol that is unique within its game.
//! Symbols come from an ordered list of categories; a category is only used
//! once all earlier categories are exhausted. One extra symbol is reserved
//! for the first player whose name is an alias of Santa.
//!
//! Granted symbols are never handed back while the game lives, so the
//! per-game capacity is fixed at [`identity_capacity`] pool symbols.

use rand::Rng;

/// Identity granted once per game to a Santa alias
pub const SANTA: char = '🎅';

/// Lowercase names that count as Santa
pub const SANTA_ALIASES: [&str; 10] = [
    "santa",
    "santa claus",
    "father christmas",
    "father xmas",
    "saint nicholas",
    "st. nicholas",
    "saint nick",
    "st. nick",
    "kris kringle",
    "kringle",
];

/// Identity categories in allocation order
pub const CATEGORIES: [&str; 5] = [
    "😛👽💩🤖👾👻😸🙈👶🐶🦁🐴🦄🐮🐷⛄🎃🌛🐐🐪🐘🐭🐰🐿🐨🐼🐔🐣🐧🕊🐸🐊🐢🐍🐳🐟🐡🐙🦀🐌🐜🐝🐞🕷",
    "🐚⛷🚣🏎👌👃💋🕶🎒👟👑🎓💎🍇🍉🍋🍍🍎🍓🍅🍄🍞🧀🍔🍟🍕🌭🍿🍦🍩🍪🎂🍫🍭☕🍽🗽🎠💈🚂🚌🚲🛢⚓⏰☂🎈📖🕯💡📷📺💾☎🎷🔔🏐🔮🎮🎲📡💼📬☯⚛🏁",
    "🂡🂢🂣🂤🂥🂦🂧🂨🂩🂪🂫🂭🂮🂱🂲🂳🂴🂵🂶🂷🂸🂹🂺🂻🂽🂾🃁🃂🃃🃄🃅🃆🃇🃈🃉🃊🃋🃍🃎🃑🃒🃓🃔🃕🃖🃗🃘🃙🃚🃛🃝🃞🂿",
    "🁣🁤🁥🁦🁧🁨🁩🁪🁫🁬🁭🁮🁯🁰🁱🁲🁳🁴🁵🁶🁷🁸🁹🁺🁻🁼🁽🁾🁿🂀🂁🂂🂃🂄🂅🂆🂇🂈🂉🂊🂋🂌🂍🂎🂏🂐🂑🂒🂓",
    "①②③④⑤⑥⑦⑧⑨⑩⑪⑫⑬⑭⑮⑯⑰⑱⑲⑳",
];

/// Number of pool symbols one game can hand out, excluding [`SANTA`].
/// Joins must be refused before a roster reaches this size.
pub fn identity_capacity() -> usize {
    CATEGORIES.iter().map(|category| category.chars().count()).sum()
}

pub fn is_santa(name: &str) -> bool {
    let name = name.to_lowercase();
    SANTA_ALIASES.contains(&name.as_str())
}

/// Tracks which identities a single game has granted
#[derive(Debug, Clone)]
pub struct IdentityPool {
    categories: Vec<Vec<char>>,
    used: Vec<Vec<bool>>,
    santa_reserved: bool,
}

impl Default for IdentityPool {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityPool {
    pub fn new() -> Self {
        Self::with_categories(&CATEGORIES)
    }

    /// Builds a pool over custom categories. Symbols must be unique.
    pub fn with_categories(categories: &[&str]) -> Self {
        let categories: Vec<Vec<char>> = categories
            .iter()
            .map(|category| category.chars().collect())
            .collect();
        let used = categories
            .iter()
            .map(|symbols| vec![false; symbols.len()])
            .collect();

        Self {
            categories,
            used,
            santa_reserved: false,
        }
    }

    /// Whether the reserved Santa identity has been granted
    pub fn santa_reserved(&self) -> bool {
        self.santa_reserved
    }

    /// Grants an identity for `name`, or `None` once every category is
    /// exhausted.
    pub fn allocate<R: Rng + ?Sized>(&mut self, name: &str, rng: &mut R) -> Option<char> {
        if !self.santa_reserved && is_santa(name) {
            self.santa_reserved = true;
            return Some(SANTA);
        }

        (0..self.categories.len()).find_map(|category| self.grab_from(category, rng))
    }

    /// Probes one category circularly from a random starting slot
    fn grab_from<R: Rng + ?Sized>(&mut self, category: usize, rng: &mut R) -> Option<char> {
        let symbols = &self.categories[category];
        let used = &mut self.used[category];
        let len = symbols.len();
        if len == 0 {
            return None;
        }

        let start = rng.gen_range(0..len);
        let slot = (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&slot| !used[slot])?;

        used[slot] = true;
        Some(symbols[slot])
    }
}
