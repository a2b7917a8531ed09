//! Heuristic query classification
//!
//! Maps a query onto four independent facets (simple, complex, technical,
//! creative) using keyword and regex tables. Pure functions: no model call,
//! no state, no allocation beyond lowercasing the query.

use regex::Regex;
use std::sync::LazyLock;

/// A named table of substring cues
#[derive(Debug)]
pub struct CueList {
    pub name: &'static str,
    pub cues: &'static [&'static str],
}

impl CueList {
    /// First cue that occurs in the already-lowercased query
    pub fn find(&self, lower: &str) -> Option<&'static str> {
        self.cues.iter().copied().find(|cue| lower.contains(cue))
    }
}

/// Queries with at most this many words are simple
pub const VERY_SHORT_WORDS: usize = 6;
/// Queries shorter than this may be simple when a simple cue is present
pub const SHORT_WORDS: usize = 15;
/// Queries longer than this are complex
pub const LONG_WORDS: usize = 20;
/// Distinct question words that mark a query as complex
pub const MIN_QUESTION_WORDS: usize = 2;

pub const CREATIVE_CUES: CueList = CueList {
    name: "creative",
    cues: &[
        "story", "poem", "creative", "write a", "imagine", "fiction", "sci-fi", "sci fi",
        "science fiction", "fantasy", "narrative", "tale", "compose", "draft", "marketing",
        "slogan", "advertisement", "blog post", "novel", "screenplay", "dialogue", "character",
        "plot", "creative writing", "short story", "write me", "artistic", "brainstorm",
        "ideas for",
    ],
};

pub const CODE_ACTIONS: CueList = CueList {
    name: "code action",
    cues: &["write", "implement", "create", "build", "develop", "make"],
};

pub const CODE_OBJECTS: CueList = CueList {
    name: "code object",
    cues: &["function", "class", "program", "script", "application", "module"],
};

pub const SIMPLE_CUES: CueList = CueList {
    name: "simple",
    cues: &[
        "what is", "what's", "who is", "who's", "where is", "where's", "when is", "when's",
        "what are", "who are", "where are", "how many", "how much", "capital of",
        "population of", "definition of", "meaning of", "name of", "list of", "what does",
        "tell me about", "what year", "which",
    ],
};

pub const REASONING_CUES: CueList = CueList {
    name: "reasoning",
    cues: &[
        "explain", "step by step", "how does", "why does", "how do", "why do", "reasoning",
        "analyze", "analyse", "compare", "contrast", "evaluate", "discuss", "architecture",
        "mechanism", "process", "theory", "concept", "in detail", "detailed", "comprehensive",
        "elaborate", "describe how", "walk me through", "break down", "deep dive",
        "understand", "works", "relationship between", "difference between", "pros and cons",
        "advantages and disadvantages", "implications", "consequences", "critical analysis",
    ],
};

pub const QUESTION_WORDS: CueList = CueList {
    name: "question word",
    cues: &["what", "why", "how", "when", "where", "which"],
};

/// Word-bounded technical terms: languages, data structures, infrastructure
const TECHNICAL_PATTERNS: &[&str] = &[
    r"\bcode\b", r"\bfunction\b", r"\bimplement\b", r"\balgorithm\b", r"\bpython\b",
    r"\bjava\b", r"\bjavascript\b", r"\btypescript\b", r"\bprogram\b", r"\bdebug\b",
    r"\bsyntax\b", r"\bclass\b", r"\bmethod\b", r"\bapi\b", r"\brest api\b",
    r"\bdatabase\b", r"\bsql\b", r"\bmysql\b", r"\bpostgresql\b", r"\bmongodb\b",
    r"\bbinary search\b", r"\bsort\b", r"\bsorted\b", r"\bdata structure\b",
    r"\bdata science\b", r"\bmachine learning\b", r"\bdeep learning\b",
    r"\bneural network\b", r"\binterview\b", r"\bcoding\b", r"\btechnical\b",
    r"\bstack\b", r"\bqueue\b", r"\blinked list\b", r"\btree\b", r"\bgraph\b",
    r"\bhash\b", r"\barray\b", r"\bloop\b", r"\brecursion\b", r"\bdynamic programming\b",
    r"\btime complexity\b", r"\bspace complexity\b", r"\bbig o\b", r"\bo\(n\)",
    r"\bvariable\b", r"\breturn\b", r"\bif statement\b", r"\bfor loop\b",
    r"\bwhile loop\b", r"\bframework\b", r"\blibrary\b", r"\bpackage\b", r"\bmodule\b",
    r"\bgit\b", r"\bversion control\b", r"\bdocker\b", r"\bkubernetes\b", r"\baws\b",
    r"\bazure\b", r"\bcloud\b", r"\bbackend\b", r"\bfrontend\b", r"\bfull.?stack\b",
    r"\breact\b", r"\bangular\b", r"\bvue\b", r"\bnode\b", r"\bdjango\b", r"\bflask\b",
    r"\bspring\b",
];

static TECHNICAL_REGEXES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    TECHNICAL_PATTERNS
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some((*pattern, re)),
            Err(e) => {
                tracing::error!(pattern = %pattern, error = %e, "Invalid technical pattern");
                None
            }
        })
        .collect()
});

/// Why a facet matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    /// A cue from the named table occurred in the query
    Cue {
        table: &'static str,
        cue: &'static str,
    },
    /// A technical regex matched
    Pattern(&'static str),
    /// Both a code action and a code object occurred
    CodeRequest {
        action: &'static str,
        object: &'static str,
    },
    /// Word count crossed a threshold
    WordCount(usize),
    /// Several distinct question words occurred
    QuestionWords(usize),
}

impl std::fmt::Display for Evidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Evidence::Cue { table, cue } => write!(f, "{table} cue '{cue}'"),
            Evidence::Pattern(pattern) => write!(f, "technical pattern {pattern}"),
            Evidence::CodeRequest { action, object } => {
                write!(f, "code request '{action}' + '{object}'")
            }
            Evidence::WordCount(words) => write!(f, "{words} words"),
            Evidence::QuestionWords(count) => write!(f, "{count} question words"),
        }
    }
}

fn word_count(query: &str) -> usize {
    query.split_whitespace().count()
}

pub fn creative_evidence(query: &str) -> Option<Evidence> {
    let lower = query.to_lowercase();
    CREATIVE_CUES.find(&lower).map(|cue| Evidence::Cue {
        table: CREATIVE_CUES.name,
        cue,
    })
}

pub fn technical_evidence(query: &str) -> Option<Evidence> {
    let lower = query.to_lowercase();

    if let Some((pattern, _)) = TECHNICAL_REGEXES.iter().find(|(_, re)| re.is_match(&lower)) {
        return Some(Evidence::Pattern(pattern));
    }

    match (CODE_ACTIONS.find(&lower), CODE_OBJECTS.find(&lower)) {
        (Some(action), Some(object)) => Some(Evidence::CodeRequest { action, object }),
        _ => None,
    }
}

pub fn simple_evidence(query: &str) -> Option<Evidence> {
    let words = word_count(query);
    let lower = query.to_lowercase();

    if words < SHORT_WORDS
        && let Some(cue) = SIMPLE_CUES.find(&lower)
    {
        return Some(Evidence::Cue {
            table: SIMPLE_CUES.name,
            cue,
        });
    }

    (words <= VERY_SHORT_WORDS).then_some(Evidence::WordCount(words))
}

pub fn complex_evidence(query: &str) -> Option<Evidence> {
    let words = word_count(query);
    if words > LONG_WORDS {
        return Some(Evidence::WordCount(words));
    }

    let lower = query.to_lowercase();
    if let Some(cue) = REASONING_CUES.find(&lower) {
        return Some(Evidence::Cue {
            table: REASONING_CUES.name,
            cue,
        });
    }

    let question_words = QUESTION_WORDS
        .cues
        .iter()
        .filter(|word| lower.contains(*word))
        .count();
    (question_words >= MIN_QUESTION_WORDS).then_some(Evidence::QuestionWords(question_words))
}

/// Creative writing, marketing copy or brainstorming
pub fn is_creative(query: &str) -> bool {
    creative_evidence(query).is_some()
}

/// Programming, data structures or infrastructure
pub fn is_technical(query: &str) -> bool {
    technical_evidence(query).is_some()
}

/// Short factual lookup
pub fn is_simple(query: &str) -> bool {
    simple_evidence(query).is_some()
}

/// Long or reasoning-heavy
pub fn is_complex(query: &str) -> bool {
    complex_evidence(query).is_some()
}

/// Router-level class, in router precedence: technical > complex > simple
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryClass {
    Technical,
    Complex,
    Simple,
    General,
}

impl QueryClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryClass::Technical => "technical",
            QueryClass::Complex => "complex",
            QueryClass::Simple => "simple",
            QueryClass::General => "general",
        }
    }
}

impl std::fmt::Display for QueryClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All four facets of a query with the evidence behind each
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryProfile {
    pub creative: Option<Evidence>,
    pub technical: Option<Evidence>,
    pub simple: Option<Evidence>,
    pub complex: Option<Evidence>,
}

impl QueryProfile {
    pub fn of(query: &str) -> Self {
        Self {
            creative: creative_evidence(query),
            technical: technical_evidence(query),
            simple: simple_evidence(query),
            complex: complex_evidence(query),
        }
    }

    /// Class with the evidence that decided it
    pub fn class(&self) -> (QueryClass, Option<&Evidence>) {
        if let Some(evidence) = &self.technical {
            (QueryClass::Technical, Some(evidence))
        } else if let Some(evidence) = &self.complex {
            (QueryClass::Complex, Some(evidence))
        } else if let Some(evidence) = &self.simple {
            (QueryClass::Simple, Some(evidence))
        } else {
            (QueryClass::General, None)
        }
    }
}
