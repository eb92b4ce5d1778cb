//! Keyword tables driving classification and the descriptive template fields.
//!
//! Every check is a plain substring test against lower-cased text. A set
//! "hits" once per keyword present, however often it occurs.

#[derive(Debug, Clone, Copy)]
pub struct KeywordSet {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

impl KeywordSet {
    /// Number of distinct keywords present in `text`.
    pub fn hits(&self, text: &str) -> usize {
        self.keywords.iter().filter(|k| text.contains(*k)).count()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k))
    }
}

/// Label of the first set in `table` with any keyword present.
pub fn first_match(table: &[KeywordSet], text: &str) -> Option<&'static str> {
    table.iter().find(|set| set.matches(text)).map(|set| set.label)
}

/// Labels of every set in `table` with any keyword present, in table order.
pub fn all_matches(table: &[KeywordSet], text: &str) -> Vec<&'static str> {
    table
        .iter()
        .filter(|set| set.matches(text))
        .map(|set| set.label)
        .collect()
}

pub const TECHNICAL: KeywordSet = KeywordSet {
    label: "technical",
    keywords: &["code", "programming", "function", "algorithm", "debug", "error"],
};

pub const CREATIVE: KeywordSet = KeywordSet {
    label: "creative",
    keywords: &["story", "write", "creative", "character", "plot", "design"],
};

pub const TECH_FOCUS: &[KeywordSet] = &[
    KeywordSet {
        label: "Web Development",
        keywords: &["html", "css", "javascript", "react", "vue"],
    },
    KeywordSet {
        label: "Backend Development",
        keywords: &["server", "api", "database", "node", "python"],
    },
    KeywordSet {
        label: "Data Science",
        keywords: &["data", "analysis", "pandas", "numpy", "machine learning"],
    },
    KeywordSet {
        label: "Mobile Development",
        keywords: &["mobile", "app", "ios", "android", "flutter"],
    },
];

pub const TECH_COMPLEXITY: &[KeywordSet] = &[
    KeywordSet {
        label: "High",
        keywords: &["algorithm", "optimization", "architecture", "design pattern"],
    },
    KeywordSet {
        label: "Medium",
        keywords: &["function", "class", "method", "implementation"],
    },
    KeywordSet {
        label: "Low",
        keywords: &["variable", "basic", "simple", "beginner"],
    },
];

/// Checked against the first user message only.
pub const CREATIVE_THEME: &[KeywordSet] = &[
    KeywordSet {
        label: "Storytelling",
        keywords: &["story"],
    },
    KeywordSet {
        label: "Character Development",
        keywords: &["character"],
    },
    KeywordSet {
        label: "Writing Project",
        keywords: &["write"],
    },
    KeywordSet {
        label: "Design Project",
        keywords: &["design"],
    },
];

pub const CREATIVE_STYLE: &[KeywordSet] = &[
    KeywordSet {
        label: "Fiction",
        keywords: &["story", "character", "plot", "narrative"],
    },
    KeywordSet {
        label: "Poetry",
        keywords: &["poem", "verse", "rhyme", "stanza"],
    },
    KeywordSet {
        label: "Screenplay",
        keywords: &["script", "dialogue", "scene", "screenplay"],
    },
    KeywordSet {
        label: "Article",
        keywords: &["article", "blog", "content", "writing"],
    },
];

/// Broad subject areas counted by the context brief.
pub const TOPIC_DOMAINS: &[KeywordSet] = &[
    KeywordSet {
        label: "programming",
        keywords: &["code", "programming", "javascript", "python", "html", "css"],
    },
    KeywordSet {
        label: "business",
        keywords: &["business", "marketing", "strategy", "company", "revenue"],
    },
    KeywordSet {
        label: "education",
        keywords: &["learn", "study", "explain", "understand", "teach"],
    },
    KeywordSet {
        label: "creative",
        keywords: &["write", "creative", "story", "design", "art"],
    },
    KeywordSet {
        label: "technical",
        keywords: &["technical", "system", "software", "hardware", "tech"],
    },
];

pub const ERROR_MARKERS: KeywordSet = KeywordSet {
    label: "error",
    keywords: &["error", "bug", "issue"],
};

/// Narrower set used to pick the line that gets quoted.
pub const ERROR_LINE_MARKERS: KeywordSet = KeywordSet {
    label: "error line",
    keywords: &["error", "bug"],
};

pub const OBJECTIVE_MARKERS: KeywordSet = KeywordSet {
    label: "objective",
    keywords: &["i want", "i need"],
};

pub const POLITE_MARKERS: KeywordSet = KeywordSet {
    label: "polite",
    keywords: &["please", "thank"],
};

pub const HOW_TO: KeywordSet = KeywordSet {
    label: "How-to",
    keywords: &["how to", "how can"],
};

pub const EXPLANATION: KeywordSet = KeywordSet {
    label: "Explanation",
    keywords: &["what is", "explain"],
};

pub const PROBLEM: KeywordSet = KeywordSet {
    label: "Problem solving",
    keywords: &["help", "problem"],
};

pub const CODING: KeywordSet = KeywordSet {
    label: "Programming",
    keywords: &["code", "programming"],
};

pub const REQUEST_MARKERS: KeywordSet = KeywordSet {
    label: "request",
    keywords: &["please", "can you"],
};

pub const CASUAL_MARKERS: KeywordSet = KeywordSet {
    label: "casual",
    keywords: &["hey", "thanks"],
};
