//! Column mapping from OCI cost report headers to CBF headers

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::warn;

/// Prefix of OCI tag columns, e.g. `tags/Oracle-Tags.CreatedBy`
pub const SOURCE_TAG_PREFIX: &str = "tags/";

/// Prefix of CBF resource tag columns
pub const CBF_TAG_PREFIX: &str = "resource/tag:";

/// Tag key carrying the resolved tenancy name
pub const TENANCY_NAME_TAG: &str = "oci_tenancy_name";

/// Every OCI line item is usage
pub const LINE_ITEM_TYPE: &str = "Usage";

/// Characters CBF does not accept in tag keys
static INVALID_TAG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_.:+@=\-/]+").unwrap());

/// Fixed CBF columns, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CbfColumn {
    LineItemId,
    LineItemType,
    LineItemDescription,
    UsageStart,
    UsageEnd,
    ResourceId,
    ResourceService,
    ResourceAccount,
    ResourceRegion,
    ActionAccount,
    UsageAmount,
    Cost,
}

impl CbfColumn {
    /// All fixed columns in output order
    pub const ALL: [CbfColumn; 12] = [
        CbfColumn::LineItemId,
        CbfColumn::LineItemType,
        CbfColumn::LineItemDescription,
        CbfColumn::UsageStart,
        CbfColumn::UsageEnd,
        CbfColumn::ResourceId,
        CbfColumn::ResourceService,
        CbfColumn::ResourceAccount,
        CbfColumn::ResourceRegion,
        CbfColumn::ActionAccount,
        CbfColumn::UsageAmount,
        CbfColumn::Cost,
    ];

    /// CBF header name
    pub fn header(self) -> &'static str {
        match self {
            CbfColumn::LineItemId => "lineitem/id",
            CbfColumn::LineItemType => "lineitem/type",
            CbfColumn::LineItemDescription => "lineitem/description",
            CbfColumn::UsageStart => "time/usage_start",
            CbfColumn::UsageEnd => "time/usage_end",
            CbfColumn::ResourceId => "resource/id",
            CbfColumn::ResourceService => "resource/service",
            CbfColumn::ResourceAccount => "resource/account",
            CbfColumn::ResourceRegion => "resource/region",
            CbfColumn::ActionAccount => "action/account",
            CbfColumn::UsageAmount => "usage/amount",
            CbfColumn::Cost => "cost/cost",
        }
    }

    /// OCI column feeding this CBF column (`None` for constants)
    pub fn source(self) -> Option<&'static str> {
        match self {
            CbfColumn::LineItemId => Some(SourceColumn::REFERENCE_NO),
            CbfColumn::LineItemType => None,
            CbfColumn::LineItemDescription => Some(SourceColumn::DESCRIPTION),
            CbfColumn::UsageStart => Some(SourceColumn::USAGE_START),
            CbfColumn::UsageEnd => Some(SourceColumn::USAGE_END),
            CbfColumn::ResourceId => Some(SourceColumn::RESOURCE_ID),
            CbfColumn::ResourceService => Some(SourceColumn::SERVICE),
            CbfColumn::ResourceAccount | CbfColumn::ActionAccount => {
                Some(SourceColumn::TENANT_ID)
            }
            CbfColumn::ResourceRegion => Some(SourceColumn::REGION),
            CbfColumn::UsageAmount => Some(SourceColumn::BILLED_QUANTITY),
            CbfColumn::Cost => Some(SourceColumn::MY_COST),
        }
    }
}

/// OCI cost report column names
pub struct SourceColumn;

impl SourceColumn {
    pub const REFERENCE_NO: &'static str = "lineItem/referenceNo";
    pub const DESCRIPTION: &'static str = "product/Description";
    pub const USAGE_START: &'static str = "lineItem/intervalUsageStart";
    pub const USAGE_END: &'static str = "lineItem/intervalUsageEnd";
    pub const RESOURCE_ID: &'static str = "product/resourceId";
    pub const SERVICE: &'static str = "product/service";
    pub const TENANT_ID: &'static str = "lineItem/tenantId";
    pub const REGION: &'static str = "product/region";
    pub const BILLED_QUANTITY: &'static str = "usage/billedQuantity";
    pub const MY_COST: &'static str = "cost/myCost";

    /// Columns a report must have
    pub const REQUIRED: [&'static str; 10] = [
        Self::REFERENCE_NO,
        Self::DESCRIPTION,
        Self::USAGE_START,
        Self::USAGE_END,
        Self::RESOURCE_ID,
        Self::SERVICE,
        Self::TENANT_ID,
        Self::REGION,
        Self::BILLED_QUANTITY,
        Self::MY_COST,
    ];
}

/// What a source header contributes to the CBF output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnClass {
    /// Feeds one or more fixed CBF columns
    Fixed,
    /// Becomes `resource/tag:<key>`
    Tag(String),
    /// Not carried over
    Ignored,
}

/// Classify a source header
pub fn classify(header: &str) -> ColumnClass {
    if let Some(key) = header.strip_prefix(SOURCE_TAG_PREFIX) {
        let (cleaned, stripped) = sanitize_tag_key(key);
        if stripped {
            warn!("Some characters were stripped from OCI tag column '{header}'");
        }
        ColumnClass::Tag(cleaned)
    } else if SourceColumn::REQUIRED.contains(&header) {
        ColumnClass::Fixed
    } else {
        ColumnClass::Ignored
    }
}

/// Strip characters CBF does not allow from a tag key
///
/// Returns the cleaned key and whether anything was removed.
pub fn sanitize_tag_key(key: &str) -> (String, bool) {
    let cleaned = INVALID_TAG_CHARS.replace_all(key, "").into_owned();
    let stripped = cleaned.len() != key.len();
    (cleaned, stripped)
}

/// A tag column carried into the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagColumn {
    /// Index in the source record
    pub index: usize,
    /// CBF header, `resource/tag:<key>`
    pub header: String,
}

/// How to build CBF rows from one report's records
#[derive(Debug, Clone)]
pub struct ColumnPlan {
    /// Source index for each fixed column (`None` for constants)
    fixed: Vec<(CbfColumn, Option<usize>)>,
    /// Tag columns in source order
    tags: Vec<TagColumn>,
    usage_start: usize,
    tenant_id: usize,
}

impl ColumnPlan {
    /// Build a plan from a report's header row
    pub fn from_headers<'a, I>(headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let headers: Vec<&str> = headers.into_iter().collect();
        let index_of = |name: &str| {
            headers
                .iter()
                .position(|h| *h == name)
                .ok_or_else(|| Error::MissingColumn {
                    column: name.to_string(),
                })
        };

        let mut fixed = Vec::with_capacity(CbfColumn::ALL.len());
        for column in CbfColumn::ALL {
            let index = column.source().map(index_of).transpose()?;
            fixed.push((column, index));
        }

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(TENANCY_NAME_TAG.to_string());
        let mut tags = Vec::new();

        for (index, header) in headers.iter().enumerate() {
            if let ColumnClass::Tag(key) = classify(header) {
                if key.is_empty() {
                    warn!("Dropping tag column '{header}': no valid characters in key");
                } else if !seen.insert(key.clone()) {
                    warn!("Dropping tag column '{header}': key '{key}' already in use");
                } else {
                    tags.push(TagColumn {
                        index,
                        header: format!("{CBF_TAG_PREFIX}{key}"),
                    });
                }
            }
        }

        Ok(Self {
            fixed,
            tags,
            usage_start: index_of(SourceColumn::USAGE_START)?,
            tenant_id: index_of(SourceColumn::TENANT_ID)?,
        })
    }

    /// CBF header row
    pub fn headers(&self) -> Vec<String> {
        self.fixed
            .iter()
            .map(|(column, _)| column.header().to_string())
            .chain(self.tags.iter().map(|t| t.header.clone()))
            .chain(std::iter::once(format!("{CBF_TAG_PREFIX}{TENANCY_NAME_TAG}")))
            .collect()
    }

    /// Fixed columns with their source index
    pub fn fixed(&self) -> &[(CbfColumn, Option<usize>)] {
        &self.fixed
    }

    /// Tag columns carried over
    pub fn tags(&self) -> &[TagColumn] {
        &self.tags
    }

    /// Source index of the usage start timestamp
    pub fn usage_start(&self) -> usize {
        self.usage_start
    }

    /// Source index of the tenancy id
    pub fn tenant_id(&self) -> usize {
        self.tenant_id
    }
}
