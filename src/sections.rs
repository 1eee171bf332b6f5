//! Static contest section reference data.
//!
//! Each section code maps to the state or province it lies in (used for the
//! ADIF `STATE` field) and a descriptive name. The built-in table is parsed
//! once per process and shared read-only; [`SectionCatalog::parse`] accepts
//! the same whitespace-separated layout so an updated table can be loaded
//! from disk.

use std::sync::OnceLock;

use hashbrown::HashMap;

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    /// Section code, e.g. `EMA`.
    pub code: String,
    /// State or province abbreviation; `None` for multi-state sections and DX.
    pub state: Option<String>,
    /// Call area the section belongs to (`1`..`0`, `VE`, `DX`).
    pub call_area: String,
    /// Descriptive name.
    pub name: String,
}

/// Immutable section lookup table.
#[derive(Debug, Clone, Default)]
pub struct SectionCatalog {
    by_code: HashMap<String, SectionInfo>,
    codes: Vec<String>,
}

// seq state area code name
const BUILTIN: &str = "\
# ARRL and RAC sections
1  CT 1  CT  Connecticut
2  MA 1  EMA Eastern Massachusetts
3  ME 1  ME  Maine
4  NH 1  NH  New Hampshire
5  RI 1  RI  Rhode Island
6  VT 1  VT  Vermont
7  MA 1  WMA Western Massachusetts
8  NY 2  ENY Eastern New York
9  NY 2  NLI New York City - Long Island
10 NJ 2  NNJ Northern New Jersey
11 NY 2  NNY Northern New York
12 NJ 2  SNJ Southern New Jersey
13 NY 2  WNY Western New York
14 DE 3  DE  Delaware
15 PA 3  EPA Eastern Pennsylvania
16 MD 3  MDC Maryland - DC
17 PA 3  WPA Western Pennsylvania
18 AL 4  AL  Alabama
19 GA 4  GA  Georgia
20 KY 4  KY  Kentucky
21 NC 4  NC  North Carolina
22 FL 4  NFL Northern Florida
23 PR 4  PR  Puerto Rico
24 SC 4  SC  South Carolina
25 FL 4  SFL Southern Florida
26 TN 4  TN  Tennessee
27 VA 4  VA  Virginia
28 VI 4  VI  US Virgin Islands
29 FL 4  WCF West Central Florida
30 AR 5  AR  Arkansas
31 LA 5  LA  Louisiana
32 MS 5  MS  Mississippi
33 NM 5  NM  New Mexico
34 TX 5  NTX North Texas
35 OK 5  OK  Oklahoma
36 TX 5  STX South Texas
37 TX 5  WTX West Texas
38 CA 6  EB  East Bay
39 CA 6  LAX Los Angeles
40 CA 6  ORG Orange
41 -- 6  PAC Pacific
42 CA 6  SB  Santa Barbara
43 CA 6  SCV Santa Clara Valley
44 CA 6  SDG San Diego
45 CA 6  SF  San Francisco
46 CA 6  SJV San Joaquin Valley
47 CA 6  SV  Sacramento Valley
48 AK 7  AK  Alaska
49 AZ 7  AZ  Arizona
50 WA 7  EWA Eastern Washington
51 ID 7  ID  Idaho
52 MT 7  MT  Montana
53 NV 7  NV  Nevada
54 OR 7  OR  Oregon
55 UT 7  UT  Utah
56 WA 7  WWA Western Washington
57 WY 7  WY  Wyoming
58 MI 8  MI  Michigan
59 OH 8  OH  Ohio
60 WV 8  WV  West Virginia
61 IL 9  IL  Illinois
62 IN 9  IN  Indiana
63 WI 9  WI  Wisconsin
64 CO 0  CO  Colorado
65 IA 0  IA  Iowa
66 KS 0  KS  Kansas
67 MN 0  MN  Minnesota
68 MO 0  MO  Missouri
69 NE 0  NE  Nebraska
70 ND 0  ND  North Dakota
71 SD 0  SD  South Dakota
72 AB VE AB  Alberta
73 BC VE BC  British Columbia
74 ON VE GH  Golden Horseshoe
75 MB VE MB  Manitoba
76 NB VE NB  New Brunswick
77 NL VE NL  Newfoundland and Labrador
78 NS VE NS  Nova Scotia
79 ON VE ONE Ontario East
80 ON VE ONN Ontario North
81 ON VE ONS Ontario South
82 PE VE PE  Prince Edward Island
83 QC VE QC  Quebec
84 SK VE SK  Saskatchewan
85 -- VE TER Territories
86 -- DX DX  DX
";

impl SectionCatalog {
    /// Process-wide catalog built from the compiled-in table.
    pub fn global() -> &'static SectionCatalog {
        static CATALOG: OnceLock<SectionCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| SectionCatalog::parse(BUILTIN))
    }

    /// Parses `seq state area code name...` rows; `#` starts a comment line.
    /// Rows with fewer than five columns are skipped.
    pub fn parse(text: &str) -> SectionCatalog {
        let mut catalog = SectionCatalog::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut cols = line.split_whitespace();
            let (Some(_seq), Some(state), Some(area), Some(code)) =
                (cols.next(), cols.next(), cols.next(), cols.next())
            else {
                tracing::warn!(line, "skipping short section row");
                continue;
            };
            let name = cols.collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                tracing::warn!(line, "skipping section row without a name");
                continue;
            }
            let info = SectionInfo {
                code: code.to_ascii_uppercase(),
                state: (state != "--").then(|| state.to_string()),
                call_area: area.to_string(),
                name,
            };
            if !catalog.by_code.contains_key(&info.code) {
                catalog.codes.push(info.code.clone());
            }
            catalog.by_code.insert(info.code.clone(), info);
        }
        catalog
    }

    pub fn get(&self, code: &str) -> Option<&SectionInfo> {
        self.by_code.get(code.trim().to_ascii_uppercase().as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// State or province for `code`, used for the ADIF `STATE` field.
    pub fn state_for(&self, code: &str) -> Option<&str> {
        self.get(code).and_then(|info| info.state.as_deref())
    }

    /// Sections whose code starts with `prefix`, in table order.
    pub fn candidates(&self, prefix: &str) -> Vec<&SectionInfo> {
        let prefix = prefix.trim().to_ascii_uppercase();
        self.codes
            .iter()
            .filter(|code| code.starts_with(prefix.as_str()))
            .filter_map(|code| self.by_code.get(code))
            .collect()
    }

    /// Section codes in table order.
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
