// Domain keyword table: configuration data for the domain-keyword label rule.
//
// An ordered list of named domains, each with lowercase keyword substrings,
// plus a separate priority list that breaks score ties (most specific domains
// first). The built-in table targets personal-finance surveys; a different
// table can be loaded from JSON:
//
//   { "domains":  [{ "name": "Loan Management", "keywords": ["loan", "repay"] }],
//     "priority": ["Loan Management"] }

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub keywords: Vec<String>,
}

impl Domain {
    /// Non-overlapping keyword matches in an already lowercased text. Where
    /// matches overlap, the earliest (then longest) one is kept.
    fn hits(&self, text: &str) -> usize {
        let mut spans: Vec<(usize, usize)> = self
            .keywords
            .iter()
            .flat_map(|kw| {
                text.match_indices(kw.as_str())
                    .map(|(start, m)| (start, start + m.len()))
            })
            .collect();
        spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut count = 0;
        let mut covered_to = 0;
        for (start, end) in spans {
            if start >= covered_to {
                count += 1;
                covered_to = end;
            }
        }
        count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTable {
    pub domains: Vec<Domain>,
    /// Tie-break order. Domains missing from this list rank after the listed
    /// ones, in table order.
    #[serde(default)]
    pub priority: Vec<String>,
}

/// (name, keywords) in table order.
const BUILTIN_DOMAINS: &[(&str, &[&str])] = &[
    (
        "Investment Portfolio",
        &["invest", "portfolio", "returns", "asset allocation", "diversif"],
    ),
    (
        "Mutual Funds",
        &["mutual fund", "systematic investment", "elss", "index fund"],
    ),
    (
        "Stock Market",
        &["stock", "share market", "equity", "equities", "sensex", "nifty", "trading"],
    ),
    ("Gold & Commodities", &["gold", "silver", "commodit"]),
    (
        "Real Estate",
        &["real estate", "property", "properties", "housing", "apartment"],
    ),
    ("Insurance", &["insurance", "insured", "premium", "policy"]),
    ("Cryptocurrency", &["crypto", "bitcoin", "blockchain"]),
    (
        "Digital Payments",
        &["upi", "wallet", "payment", "paytm", "gpay", "phonepe", "contactless"],
    ),
    (
        "Digital Banking",
        &[
            "digital bank",
            "net banking",
            "online banking",
            "mobile banking",
            "banking app",
            "fintech",
            "neobank",
            "bank",
        ],
    ),
    (
        "Loan Management",
        &["loan", "borrow", "repay", "debt", "lender", "lending", "instalment", "installment"],
    ),
    (
        "Credit Health",
        &["credit score", "credit card", "cibil", "credit report", "credit limit", "credit"],
    ),
    (
        "Financial Planning",
        &["retire", "saving", "budget", "financial goal", "emergency fund", "plan"],
    ),
    (
        "Market Analysis",
        &["market", "trend", "volatil", "forecast", "outlook"],
    ),
    (
        "Economic Factors",
        &["inflation", "interest rate", "economy", "economic", "gdp", "recession", "tax"],
    ),
    (
        "Spending Behavior",
        &["spend", "shopping", "purchase", "expense", "buy", "discretionary"],
    ),
    (
        "Financial Decisions",
        &["decision", "decide", "choose", "advice", "advisor"],
    ),
];

/// Most specific first.
const BUILTIN_PRIORITY: &[&str] = &[
    "Mutual Funds",
    "Cryptocurrency",
    "Gold & Commodities",
    "Stock Market",
    "Real Estate",
    "Insurance",
    "Digital Payments",
    "Digital Banking",
    "Credit Health",
    "Loan Management",
    "Investment Portfolio",
    "Market Analysis",
    "Economic Factors",
    "Spending Behavior",
    "Financial Planning",
    "Financial Decisions",
];

impl Default for DomainTable {
    fn default() -> Self {
        Self {
            domains: BUILTIN_DOMAINS
                .iter()
                .map(|(name, keywords)| Domain {
                    name: name.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
            priority: BUILTIN_PRIORITY.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl DomainTable {
    /// Load a table from a JSON file. Keywords are lowercased on load.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read domain table from {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Invalid domain table in {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut table: DomainTable = serde_json::from_str(json)?;
        for domain in &mut table.domains {
            for keyword in &mut domain.keywords {
                *keyword = keyword.to_lowercase();
            }
            domain.keywords.retain(|k| !k.is_empty());
        }
        Ok(table)
    }

    /// Score every domain against the (lowercased) member texts: the number of
    /// keyword hits across all texts, table order. Overlapping hits within a
    /// domain count once, so "credit score" isn't also scored as "credit".
    pub fn scores(&self, texts: &[String]) -> Vec<(&str, usize)> {
        let lowered: Vec<String> = texts.iter().map(|t| t.to_lowercase()).collect();
        self.domains
            .iter()
            .map(|domain| {
                let score = lowered.iter().map(|text| domain.hits(text)).sum();
                (domain.name.as_str(), score)
            })
            .collect()
    }

    /// The winning domain: strictly highest score, ties broken by priority.
    /// None when nothing scored above zero.
    pub fn best_match(&self, texts: &[String]) -> Option<&str> {
        let scores = self.scores(texts);
        let top = scores.iter().map(|&(_, s)| s).max()?;
        if top == 0 {
            return None;
        }

        scores
            .iter()
            .enumerate()
            .filter(|(_, (_, s))| *s == top)
            .min_by_key(|(table_pos, (name, _))| (self.priority_rank(name), *table_pos))
            .map(|(_, (name, _))| *name)
    }

    fn priority_rank(&self, name: &str) -> usize {
        self.priority
            .iter()
            .position(|p| p == name)
            .unwrap_or(self.priority.len())
    }
}
