//! Variant/attribute guessing from free text (colors, finishes).

/// Default keyword table: Thai and English color names seen on picklists.
pub const BUILTIN_COLOR_KEYWORDS: &[&str] = &[
    "ขาว", "ดำ", "แดง", "น้ำเงิน", "ฟ้า", "เขียว", "เหลือง", "ชมพู", "ม่วง", "ส้ม", "เทา", "เงิน", "ทอง",
    "ทองด้าน", "ดำด้าน", "ลายจุด", "ลายดอก", "ใส", "ขุ่น", "ครีม", "น้ำตาล", "ฟ้าอ่อน", "ฟ้าเข้ม",
    "แดงเข้ม", "แดงสด", "โรสโกลด์", "ทองชมพู",
    "white", "black", "red", "blue", "green", "yellow", "pink", "purple", "orange",
    "grey", "gray", "silver", "gold", "rose gold", "matte black", "clear",
];

#[derive(Debug, Clone)]
struct Keyword {
    original: String,
    lowered: String,
}

/// Ordered keyword table. Lookups return the longest keyword contained in the
/// text; keywords of equal length keep their table order.
#[derive(Debug, Clone)]
pub struct AttributeTable {
    keywords: Vec<Keyword>,
}

impl AttributeTable {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keywords: Vec<Keyword> = keywords
            .into_iter()
            .map(|k| k.as_ref().to_string())
            .filter(|k| !k.is_empty())
            .map(|original| Keyword {
                lowered: original.to_lowercase(),
                original,
            })
            .collect();
        // Stable: equal lengths stay in table order.
        keywords.sort_by_key(|k| std::cmp::Reverse(k.original.chars().count()));
        Self { keywords }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_COLOR_KEYWORDS)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Best keyword found in `context`, as written in the table, or `""`.
    pub fn detect(&self, context: &str) -> &str {
        let haystack = context.to_lowercase();
        self.keywords
            .iter()
            .find(|k| haystack.contains(&k.lowered))
            .map(|k| k.original.as_str())
            .unwrap_or("")
    }
}

impl Default for AttributeTable {
    fn default() -> Self {
        Self::builtin()
    }
}
