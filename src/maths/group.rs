//! Finite group presentations: abelianisation, word simplification and
//! Todd–Coxeter coset enumeration.

use core::fmt::{Display, Formatter};

use crate::maths::integer::Integer;
use crate::maths::matrix::{AbelianGroup, MatrixInt};
use crate::tri_error::TriError;

/// One syllable `g^exponent` of a group word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupExpressionTerm {
    pub generator: usize,
    pub exponent: i64,
}

impl GroupExpressionTerm {
    #[inline]
    pub fn new(generator: usize, exponent: i64) -> Self {
        Self {
            generator,
            exponent,
        }
    }

    #[inline]
    pub fn inverse(self) -> Self {
        Self::new(self.generator, -self.exponent)
    }
}

/// A word in the generators, as a list of syllables.
pub type GroupWord = Vec<GroupExpressionTerm>;

/// Group `<g_0, .., g_{n-1} | relations>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupPresentation {
    n_gens: usize,
    relations: Vec<GroupWord>,
}

/// Merge adjacent syllables in the same generator and drop zero exponents.
fn free_reduce(word: &[GroupExpressionTerm]) -> GroupWord {
    let mut out: GroupWord = Vec::with_capacity(word.len());
    for &t in word {
        if t.exponent == 0 {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.generator == t.generator => {
                last.exponent += t.exponent;
                if last.exponent == 0 {
                    out.pop();
                }
            }
            _ => out.push(t),
        }
    }
    out
}

/// Free reduction followed by cyclic reduction.
fn cyclic_reduce(word: &[GroupExpressionTerm]) -> GroupWord {
    let mut w = free_reduce(word);
    while w.len() >= 2 {
        let (first, last) = (w[0], w[w.len() - 1]);
        if first.generator != last.generator {
            break;
        }
        w.pop();
        w[0].exponent += last.exponent;
        if w[0].exponent == 0 {
            w.remove(0);
        }
    }
    w
}

fn invert_word(word: &[GroupExpressionTerm]) -> GroupWord {
    word.iter().rev().map(|t| t.inverse()).collect()
}

fn word_length(word: &[GroupExpressionTerm]) -> u64 {
    word.iter().map(|t| t.exponent.unsigned_abs()).sum()
}

impl GroupPresentation {
    pub fn new(n_gens: usize) -> Self {
        Self {
            n_gens,
            relations: Vec::new(),
        }
    }

    #[inline]
    pub fn count_generators(&self) -> usize {
        self.n_gens
    }

    #[inline]
    pub fn count_relations(&self) -> usize {
        self.relations.len()
    }

    #[inline]
    pub fn relations(&self) -> &[GroupWord] {
        &self.relations
    }

    pub fn add_generator(&mut self) -> usize {
        self.n_gens += 1;
        self.n_gens - 1
    }

    /// Add a relator; every generator in it must exist.
    pub fn add_relation(&mut self, word: GroupWord) -> Result<(), TriError> {
        if let Some(bad) = word.iter().find(|t| t.generator >= self.n_gens) {
            return Err(TriError::InvalidArgument(format!(
                "relation uses generator {} of {}",
                bad.generator, self.n_gens
            )));
        }
        self.relations.push(word);
        Ok(())
    }

    /// Abelianisation via the Smith normal form of the exponent-sum matrix.
    pub fn abelianisation(&self) -> AbelianGroup {
        let mut m = MatrixInt::new(self.relations.len(), self.n_gens);
        for (r, word) in self.relations.iter().enumerate() {
            for t in word {
                *m.entry_mut(r, t.generator) += Integer::new(t.exponent);
            }
        }
        AbelianGroup::from_presentation(m)
    }

    /// Remove generator `g` (which must no longer occur) and renumber.
    fn drop_generator(&mut self, g: usize) {
        for word in &mut self.relations {
            for t in word.iter_mut() {
                if t.generator > g {
                    t.generator -= 1;
                }
            }
        }
        self.n_gens -= 1;
    }

    /// Substitute `g := replacement` in every relator.
    fn substitute(&mut self, g: usize, replacement: &[GroupExpressionTerm]) {
        let inverse = invert_word(replacement);
        for word in &mut self.relations {
            if word.iter().all(|t| t.generator != g) {
                continue;
            }
            let mut out = Vec::with_capacity(word.len());
            for &t in word.iter() {
                if t.generator != g {
                    out.push(t);
                    continue;
                }
                let piece = if t.exponent > 0 { replacement } else { &inverse[..] };
                for _ in 0..t.exponent.unsigned_abs() {
                    out.extend_from_slice(piece);
                }
            }
            *word = out;
        }
    }

    /// Simplify the presentation in place. Relators are freely and
    /// cyclically reduced, trivial relators dropped, and any generator that
    /// occurs exactly once (with exponent ±1) in some relator is eliminated
    /// by substitution, shortest relator first. Returns true if anything
    /// changed.
    pub fn simplify_words(&mut self) -> bool {
        let before = (self.n_gens, self.relations.clone());
        loop {
            for word in &mut self.relations {
                *word = cyclic_reduce(word);
            }
            self.relations.retain(|w| !w.is_empty());
            self.relations.sort_by_key(|w| word_length(w));
            self.relations.dedup();

            let mut chosen: Option<(usize, usize)> = None;
            'search: for (r, word) in self.relations.iter().enumerate() {
                for t in word {
                    if t.exponent.abs() != 1 {
                        continue;
                    }
                    if word.iter().filter(|s| s.generator == t.generator).count() == 1 {
                        chosen = Some((r, t.generator));
                        break 'search;
                    }
                }
            }
            let Some((r, g)) = chosen else { break };

            let word = self.relations.remove(r);
            let pos = word.iter().position(|t| t.generator == g).unwrap_or(0);
            let mut rotated: GroupWord = word[pos..].to_vec();
            rotated.extend_from_slice(&word[..pos]);
            let rest = &rotated[1..];
            // g^e * rest = 1
            let replacement = if rotated[0].exponent > 0 {
                invert_word(rest)
            } else {
                rest.to_vec()
            };
            self.substitute(g, &replacement);
            self.drop_generator(g);
        }
        (self.n_gens, &self.relations) != (before.0, &before.1)
    }

    /// Todd–Coxeter enumeration of the cosets of the trivial subgroup.
    ///
    /// Returns the group order if the enumeration closes without ever
    /// holding more than `limit` cosets, and `None` otherwise.
    pub fn enumerate_cosets(&self, limit: usize) -> Option<usize> {
        let mut table = CosetTable::new(self.n_gens, limit);
        let words: Vec<Vec<usize>> = self
            .relations
            .iter()
            .map(|w| {
                let mut letters = Vec::new();
                for t in free_reduce(w) {
                    let col = if t.exponent > 0 {
                        2 * t.generator
                    } else {
                        2 * t.generator + 1
                    };
                    for _ in 0..t.exponent.unsigned_abs() {
                        letters.push(col);
                    }
                }
                letters
            })
            .filter(|w| !w.is_empty())
            .collect();

        let mut a = 0;
        while a < table.len() {
            if table.is_live(a) {
                for w in &words {
                    if !table.is_live(a) {
                        break;
                    }
                    table.scan_and_fill(a, w)?;
                }
                if table.is_live(a) {
                    for x in 0..table.cols {
                        if table.get(a, x).is_none() {
                            table.define(a, x)?;
                        }
                    }
                }
            }
            a += 1;
        }
        Some(table.count_live())
    }

    /// Order of the group if coset enumeration closes within `limit`.
    pub fn order(&self, limit: usize) -> Option<usize> {
        self.enumerate_cosets(limit)
    }
}

impl Display for GroupPresentation {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let gens: Vec<String> = (0..self.n_gens).map(|g| format!("g{g}")).collect();
        let rels: Vec<String> = self
            .relations
            .iter()
            .map(|w| {
                w.iter()
                    .map(|t| {
                        if t.exponent == 1 {
                            format!("g{}", t.generator)
                        } else {
                            format!("g{}^{}", t.generator, t.exponent)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        write!(f, "< {} | {} >", gens.join(", "), rels.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Coset table (HLT strategy with coincidence processing)
// ---------------------------------------------------------------------------

const UNDEF: usize = usize::MAX;

struct CosetTable {
    cols: usize,
    limit: usize,
    rows: Vec<Vec<usize>>,
    parent: Vec<usize>,
}

impl CosetTable {
    fn new(n_gens: usize, limit: usize) -> Self {
        let cols = 2 * n_gens;
        Self {
            cols,
            limit,
            rows: vec![vec![UNDEF; cols]],
            parent: vec![0],
        }
    }

    #[inline]
    fn inv(x: usize) -> usize {
        x ^ 1
    }

    #[inline]
    fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    fn is_live(&self, c: usize) -> bool {
        self.parent[c] == c
    }

    #[inline]
    fn get(&self, c: usize, x: usize) -> Option<usize> {
        let v = self.rows[c][x];
        (v != UNDEF).then_some(v)
    }

    fn count_live(&self) -> usize {
        (0..self.len()).filter(|&c| self.is_live(c)).count()
    }

    fn define(&mut self, c: usize, x: usize) -> Option<()> {
        if self.rows.len() >= self.limit {
            return None;
        }
        let d = self.rows.len();
        self.rows.push(vec![UNDEF; self.cols]);
        self.parent.push(d);
        self.rows[c][x] = d;
        self.rows[d][Self::inv(x)] = c;
        Some(())
    }

    fn rep(&mut self, c: usize) -> usize {
        let mut root = c;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = c;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn merge(&mut self, a: usize, b: usize, queue: &mut Vec<usize>) {
        let (a, b) = (self.rep(a), self.rep(b));
        if a == b {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        self.parent[hi] = lo;
        queue.push(hi);
    }

    fn coincidence(&mut self, a: usize, b: usize) {
        let mut queue = Vec::new();
        self.merge(a, b, &mut queue);
        let mut i = 0;
        while i < queue.len() {
            let e = queue[i];
            i += 1;
            for x in 0..self.cols {
                let f = self.rows[e][x];
                if f == UNDEF {
                    continue;
                }
                let ix = Self::inv(x);
                self.rows[f][ix] = UNDEF;
                let e1 = self.rep(e);
                let f1 = self.rep(f);
                if self.rows[e1][x] != UNDEF {
                    let t = self.rows[e1][x];
                    self.merge(f1, t, &mut queue);
                } else if self.rows[f1][ix] != UNDEF {
                    let t = self.rows[f1][ix];
                    self.merge(e1, t, &mut queue);
                } else {
                    self.rows[e1][x] = f1;
                    self.rows[f1][ix] = e1;
                }
            }
        }
    }

    fn scan_and_fill(&mut self, c: usize, word: &[usize]) -> Option<()> {
        let mut f = c;
        let mut b = c;
        let mut i = 0usize;
        let mut j = word.len();
        loop {
            while i < j && self.rows[f][word[i]] != UNDEF {
                f = self.rows[f][word[i]];
                i += 1;
            }
            if i == j {
                if f != b {
                    self.coincidence(f, b);
                }
                return Some(());
            }
            while j > i && self.rows[b][Self::inv(word[j - 1])] != UNDEF {
                b = self.rows[b][Self::inv(word[j - 1])];
                j -= 1;
            }
            if j == i {
                self.coincidence(f, b);
                return Some(());
            } else if j == i + 1 {
                self.rows[f][word[i]] = b;
                self.rows[b][Self::inv(word[i])] = f;
                return Some(());
            }
            self.define(f, word[i])?;
        }
    }
}
