//! Rendering state embedded in shader comments, e.g. `/* RENDERTARGETS:0,1,2 */`.
//!
//! When a directive appears more than once, the last occurrence wins. `RENDERTARGETS`
//! takes precedence over `DRAWBUFFERS` regardless of order.

use std::collections::BTreeMap;

lazy_static::lazy_static! {
    static ref DIRECTIVE_RE: regex::Regex = regex::Regex::new(
        r"/\*\s*(DRAWBUFFERS|RENDERTARGETS|BLEND|DEPTHTEST|CULLFACE|DEPTHWRITE|ALPHATEST|FORMAT)\s*:\s*((?s:.*?))\s*\*/"
    )
    .unwrap();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
}

impl BlendFactor {
    fn parse(token: &str) -> Option<Self> {
        let factor = match token.to_ascii_uppercase().as_str() {
            "ZERO" => BlendFactor::Zero,
            "ONE" => BlendFactor::One,
            "SRC_COLOR" => BlendFactor::SrcColor,
            "ONE_MINUS_SRC_COLOR" | "INV_SRC_COLOR" => BlendFactor::OneMinusSrcColor,
            "DST_COLOR" => BlendFactor::DstColor,
            "ONE_MINUS_DST_COLOR" | "INV_DST_COLOR" => BlendFactor::OneMinusDstColor,
            "SRC_ALPHA" => BlendFactor::SrcAlpha,
            "ONE_MINUS_SRC_ALPHA" | "INV_SRC_ALPHA" => BlendFactor::OneMinusSrcAlpha,
            "DST_ALPHA" => BlendFactor::DstAlpha,
            "ONE_MINUS_DST_ALPHA" | "INV_DST_ALPHA" => BlendFactor::OneMinusDstAlpha,
            "SRC_ALPHA_SATURATE" | "SRC_ALPHA_SAT" => BlendFactor::SrcAlphaSaturate,
            _ => return None,
        };
        Some(factor)
    }
}

/// Color/alpha blend factors for all render targets of a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    Off,
    Factors {
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    },
}

impl BlendMode {
    pub const ALPHA: BlendMode = BlendMode::Factors {
        src_color: BlendFactor::SrcAlpha,
        dst_color: BlendFactor::OneMinusSrcAlpha,
        src_alpha: BlendFactor::One,
        dst_alpha: BlendFactor::OneMinusSrcAlpha,
    };

    pub const ADD: BlendMode = BlendMode::Factors {
        src_color: BlendFactor::One,
        dst_color: BlendFactor::One,
        src_alpha: BlendFactor::One,
        dst_alpha: BlendFactor::One,
    };

    pub const MULTIPLY: BlendMode = BlendMode::Factors {
        src_color: BlendFactor::DstColor,
        dst_color: BlendFactor::Zero,
        src_alpha: BlendFactor::DstAlpha,
        dst_alpha: BlendFactor::Zero,
    };

    fn parse(value: &str) -> Option<Self> {
        let tokens: Vec<&str> = value.split_whitespace().collect();
        match tokens.as_slice() {
            [single] => match single.to_ascii_uppercase().as_str() {
                "OFF" | "NONE" => Some(BlendMode::Off),
                "ALPHA" => Some(BlendMode::ALPHA),
                "ADD" | "ADDITIVE" => Some(BlendMode::ADD),
                "MULTIPLY" => Some(BlendMode::MULTIPLY),
                _ => None,
            },
            [src_color, dst_color, src_alpha, dst_alpha] => Some(BlendMode::Factors {
                src_color: BlendFactor::parse(src_color)?,
                dst_color: BlendFactor::parse(dst_color)?,
                src_alpha: BlendFactor::parse(src_alpha)?,
                dst_alpha: BlendFactor::parse(dst_alpha)?,
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl CompareFunc {
    fn parse(token: &str) -> Option<Self> {
        let func = match token.to_ascii_uppercase().as_str() {
            "NEVER" => CompareFunc::Never,
            "LESS" => CompareFunc::Less,
            "EQUAL" => CompareFunc::Equal,
            "LEQUAL" | "LESS_EQUAL" => CompareFunc::LessEqual,
            "GREATER" => CompareFunc::Greater,
            "NOTEQUAL" | "NOT_EQUAL" => CompareFunc::NotEqual,
            "GEQUAL" | "GREATER_EQUAL" => CompareFunc::GreaterEqual,
            "ALWAYS" | "OFF" => CompareFunc::Always,
            _ => return None,
        };
        Some(func)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

impl CullMode {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "NONE" | "OFF" => Some(CullMode::None),
            "FRONT" => Some(CullMode::Front),
            "BACK" => Some(CullMode::Back),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlphaTest {
    pub func: CompareFunc,
    pub reference: f32,
}

impl AlphaTest {
    /// `Some(None)` for an explicit `off`.
    fn parse(value: &str) -> Option<Option<Self>> {
        let tokens: Vec<&str> = value.split_whitespace().collect();
        match tokens.as_slice() {
            [off] if off.eq_ignore_ascii_case("off") => Some(None),
            [func, reference] => Some(Some(AlphaTest {
                func: CompareFunc::parse(func)?,
                reference: reference.parse().ok()?,
            })),
            _ => None,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Some(true),
        "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Rendering state requested by a program's comment directives.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramDirectives {
    /// Render target indices written by the pixel stage, in output order
    pub render_targets: Vec<u32>,
    /// Whether `render_targets` came from a directive or is the default `[0]`
    pub explicit_render_targets: bool,
    pub blend: Option<BlendMode>,
    pub depth_test: Option<CompareFunc>,
    pub cull_face: Option<CullMode>,
    pub depth_write: Option<bool>,
    /// `Some(None)` when alpha testing was explicitly turned off
    pub alpha_test: Option<Option<AlphaTest>>,
    /// Render target index -> texture format name
    pub formats: BTreeMap<u32, String>,
}

impl Default for ProgramDirectives {
    fn default() -> Self {
        Self {
            render_targets: vec![0],
            explicit_render_targets: false,
            blend: None,
            depth_test: None,
            cull_face: None,
            depth_write: None,
            alpha_test: None,
            formats: BTreeMap::new(),
        }
    }
}

impl ProgramDirectives {
    /// Parse directives from several sources in order; later sources override earlier ones.
    pub fn parse<'a>(sources: impl IntoIterator<Item = &'a str>) -> Self {
        let mut directives = Self::default();
        let mut draw_buffers: Option<Vec<u32>> = None;
        let mut render_targets: Option<Vec<u32>> = None;

        for source in sources {
            for captures in DIRECTIVE_RE.captures_iter(source) {
                let key = &captures[1];
                let value = &captures[2];

                let applied = match key {
                    "DRAWBUFFERS" => parse_draw_buffers(value).map(|v| draw_buffers = Some(v)),
                    "RENDERTARGETS" => {
                        parse_render_targets(value).map(|v| render_targets = Some(v))
                    }
                    "BLEND" => BlendMode::parse(value).map(|v| directives.blend = Some(v)),
                    "DEPTHTEST" => {
                        CompareFunc::parse(value).map(|v| directives.depth_test = Some(v))
                    }
                    "CULLFACE" => CullMode::parse(value).map(|v| directives.cull_face = Some(v)),
                    "DEPTHWRITE" => parse_bool(value).map(|v| directives.depth_write = Some(v)),
                    "ALPHATEST" => AlphaTest::parse(value).map(|v| directives.alpha_test = Some(v)),
                    "FORMAT" => parse_format(value).map(|(target, format)| {
                        directives.formats.insert(target, format);
                    }),
                    _ => None,
                };

                if applied.is_none() {
                    log::warn!("ignoring malformed directive {}:{}", key, value);
                }
            }
        }

        if let Some(targets) = render_targets.or(draw_buffers) {
            directives.render_targets = targets;
            directives.explicit_render_targets = true;
        }

        directives
    }
}

fn parse_draw_buffers(value: &str) -> Option<Vec<u32>> {
    if value.is_empty() {
        return None;
    }
    value.chars().map(|c| c.to_digit(10)).collect()
}

fn parse_render_targets(value: &str) -> Option<Vec<u32>> {
    value
        .split(',')
        .map(|target| target.trim().parse::<u32>().ok())
        .collect()
}

fn parse_format(value: &str) -> Option<(u32, String)> {
    let mut parts = value.splitn(2, ':');
    let target = parts.next()?.trim().parse().ok()?;
    let format = parts.next()?.trim();
    if format.is_empty() {
        None
    } else {
        Some((target, format.to_string()))
    }
}
