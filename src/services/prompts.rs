//! Image prompt construction.
//!
//! A prompt is a template intro followed by fixed constraint sections
//! (fabric fidelity, lower garment, background, framing) and, when the seller
//! typed something, a separately labeled customization section at the end.
//! Prompt text is a pure function of [`PromptContext`].

use crate::models::UploadKind;

/// Header of the seller customization section.
pub const CUSTOMIZATION_HEADER: &str = "ADDITIONAL CUSTOMIZATION";

/// Background clause used when no background image is attached.
pub const GENERIC_STUDIO_CLAUSE: &str = "BACKGROUND: Use a clean, seamless light-grey studio \
backdrop with a soft floor shadow. No props, furniture, text or scenery.";

/// Background clause used when a background image is attached.
pub const PROVIDED_BACKGROUND_CLAUSE: &str = "BACKGROUND: Use the attached background image \
verbatim as the setting. Do not repaint, recolor, blur or replace it; place the subject \
naturally inside it with matching perspective and light direction.";

/// Consistency rule for jobs that produce more than one image.
pub const VARIANT_CONSISTENCY_CLAUSE: &str = "VARIANT CONSISTENCY: This image belongs to a set \
of color variants of one design. Composition, camera angle, framing, mannequin pose, draping \
and styling must be IDENTICAL across the set. ONLY the fabric color may differ.";

const FIDELITY_CLAUSE: &str = "FABRIC FIDELITY (hard requirement): Reproduce the fabric exactly \
as it appears in the source photo: same colors, print, motifs, scale of pattern, borders, \
embroidery and texture. Do not recolor, simplify, reinterpret or invent any part of the design.";

const FRAMING_CLAUSE: &str = "FRAMING AND LIGHTING: Vertical 4:5 catalog frame, subject centered \
and shown in full from head (or bust top) to hem. Soft, even, diffused studio lighting with \
true-to-life color and no harsh shadows, color casts or lens effects. Photorealistic, sharp \
focus, no watermark or text.";

/// The three prompt templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// A model wearing a garment made from the fabric
    ModelWearing,
    /// The garment worn by the person in the photo moved onto a mannequin
    MannequinConversion,
    /// Labeled fabric pieces draped on a dress-form bust
    MultiFabricDraped,
}

/// What the image should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GarmentSpec {
    /// The garment or fabric in the source photo
    SourcePhoto,
    /// One sample of a labeled multi-fabric job
    Sample {
        description: String,
        /// Number of images generated for the job, this one included
        sibling_count: usize,
    },
    /// Every variant on its own mannequin, side by side, in one image
    Combined {
        mannequin_count: usize,
        variant_descriptions: Vec<String>,
    },
}

impl GarmentSpec {
    fn is_part_of_set(&self) -> bool {
        match self {
            Self::SourcePhoto => false,
            Self::Sample { sibling_count, .. } => *sibling_count > 1,
            Self::Combined {
                mannequin_count, ..
            } => *mannequin_count > 1,
        }
    }
}

/// Inputs to [`build_image_prompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub upload_kind: UploadKind,
    pub has_human_model: bool,
    pub has_bottom_fabric: bool,
    pub custom_prompt: Option<String>,
    pub background_provided: bool,
    pub mannequin_reference_provided: bool,
    pub garment: GarmentSpec,
}

impl PromptContext {
    /// Context for a single-job photo. The lower garment of a worn outfit is
    /// taken from the photo itself.
    pub fn for_source_photo(upload_kind: UploadKind, has_human_model: bool) -> Self {
        let worn = upload_kind == UploadKind::MannequinConversion || has_human_model;
        Self {
            upload_kind,
            has_human_model,
            has_bottom_fabric: worn,
            custom_prompt: None,
            background_provided: false,
            mannequin_reference_provided: false,
            garment: GarmentSpec::SourcePhoto,
        }
    }
}

/// Pick the template for a context.
pub fn select_template(ctx: &PromptContext) -> PromptTemplate {
    match ctx.upload_kind {
        UploadKind::LabeledMultiFabric => PromptTemplate::MultiFabricDraped,
        UploadKind::MannequinConversion => PromptTemplate::MannequinConversion,
        UploadKind::Fabric if ctx.has_human_model => PromptTemplate::MannequinConversion,
        UploadKind::Fabric => PromptTemplate::ModelWearing,
    }
}

/// Build the full image prompt.
pub fn build_image_prompt(ctx: &PromptContext) -> String {
    let template = select_template(ctx);

    let mut sections = vec![
        intro(template, &ctx.garment),
        attachments(ctx),
        FIDELITY_CLAUSE.to_string(),
        lower_garment_clause(template, ctx.has_bottom_fabric),
        background_clause(ctx.background_provided).to_string(),
        FRAMING_CLAUSE.to_string(),
    ];

    if ctx.garment.is_part_of_set() {
        sections.push(VARIANT_CONSISTENCY_CLAUSE.to_string());
    }

    if let Some(custom) = ctx
        .custom_prompt
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        sections.push(format!(
            "{} (apply only where it does not conflict with the requirements above):\n{}",
            CUSTOMIZATION_HEADER, custom
        ));
    }

    sections.join("\n\n")
}

fn intro(template: PromptTemplate, garment: &GarmentSpec) -> String {
    match (template, garment) {
        (PromptTemplate::ModelWearing, _) => "TASK: Create a professional e-commerce photograph of \
an Indian fashion model wearing a finished ethnic outfit tailored from the fabric in the source \
photo. The model stands in a relaxed, elegant pose facing the camera."
            .to_string(),
        (PromptTemplate::MannequinConversion, _) => "TASK: Move the complete outfit worn by the \
person in the source photo onto a plain white tailor's mannequin. Remove the person entirely: \
no face, skin, hair, hands or body may remain. Keep the garment's cut, fit and draping as worn."
            .to_string(),
        (PromptTemplate::MultiFabricDraped, GarmentSpec::Combined {
            mannequin_count,
            variant_descriptions,
        }) => {
            let mut text = format!(
                "TASK: Create one catalog photograph showing {} identical dress-form busts standing \
side by side in a single row, each draped with the same outfit design in a different colorway.",
                mannequin_count
            );
            for (index, description) in variant_descriptions.iter().enumerate() {
                text.push_str(&format!("\nBust {}: {}", index + 1, description));
            }
            text
        }
        (PromptTemplate::MultiFabricDraped, GarmentSpec::Sample { description, .. }) => format!(
            "TASK: Create a catalog photograph of a dress-form bust draped with a complete outfit \
made from the labeled fabric pieces in the source photo.\nOutfit: {}",
            description
        ),
        (PromptTemplate::MultiFabricDraped, GarmentSpec::SourcePhoto) => "TASK: Create a catalog \
photograph of a dress-form bust draped with a complete outfit made from the labeled fabric \
pieces in the source photo."
            .to_string(),
    }
}

/// Tell the model which attached image is which. Order matches the
/// reference list sent with the request.
fn attachments(ctx: &PromptContext) -> String {
    let mut lines = vec!["ATTACHED IMAGES:".to_string()];
    let mut index = 1;

    lines.push(format!("Image {}: source photo (the fabric to reproduce).", index));
    if ctx.mannequin_reference_provided {
        index += 1;
        lines.push(format!(
            "Image {}: mannequin reference. Match its form, finish and stand.",
            index
        ));
    }
    if ctx.background_provided {
        index += 1;
        lines.push(format!("Image {}: background.", index));
    }

    lines.join("\n")
}

fn lower_garment_clause(template: PromptTemplate, has_bottom_fabric: bool) -> String {
    match (template, has_bottom_fabric) {
        (PromptTemplate::MannequinConversion, _) => "LOWER GARMENT: Keep the lower garment exactly \
as worn in the source photo, with the same color, print and length."
            .to_string(),
        (_, true) => "LOWER GARMENT: Tailor the lower garment from the bottom fabric shown in the \
source photo, reproduced with the same fidelity rules."
            .to_string(),
        (_, false) => "LOWER GARMENT: No bottom fabric was supplied. Use a plain, solid-colored \
bottom with no print or texture, in a neutral shade that complements the top."
            .to_string(),
    }
}

fn background_clause(background_provided: bool) -> &'static str {
    if background_provided {
        PROVIDED_BACKGROUND_CLAUSE
    } else {
        GENERIC_STUDIO_CLAUSE
    }
}
