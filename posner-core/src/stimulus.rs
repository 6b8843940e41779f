use serde::{Deserialize, Serialize};

pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Placeholder side used for cue and target locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Side::Left => Location::Left,
            Side::Right => Location::Right,
        }
    }
}

/// Screen landmarks stimuli are registered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Left,
    Centre,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    #[serde(rename = "x")]
    X,
    #[serde(rename = "+")]
    Plus,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::X => "x",
            TargetType::Plus => "+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: [u8; 4],
}

/// Drawable shapes of the task.
#[derive(Debug, Clone, PartialEq)]
pub enum StimulusType {
    /// Outlined square box marking a possible target location.
    Placeholder { width: f32, stroke: Stroke },
    /// Two crossing bars; rotated by 45 degrees it becomes the `x` target.
    FixationCross {
        size: f32,
        thickness: f32,
        rotation_deg: f32,
        color: [u8; 4],
    },
}

/// Degree based geometry resolved to pixels for one screen.
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusLayout {
    pub centre: (f32, f32),
    pub box_px: f32,
    pub target_px: f32,
    pub fixation_px: f32,
    pub stroke_default_px: f32,
    pub stroke_cue_px: f32,
    pub offset_px: f32,
}

impl StimulusLayout {
    pub const BOX_DEG: f32 = 2.0;
    pub const TARGET_DEG: f32 = 1.0;
    pub const FIXATION_DEG: f32 = 1.5;
    pub const STROKE_DEFAULT_DEG: f32 = 0.1;
    pub const STROKE_CUE_DEG: f32 = 0.2;
    /// Centre to centre distance between fixation and each placeholder.
    pub const OFFSET_DEG: f32 = 5.0;

    pub fn new(screen_size_px: (u32, u32), px_per_degree: f32) -> Self {
        let deg_to_px = |deg: f32| deg * px_per_degree;
        Self {
            centre: (screen_size_px.0 as f32 / 2.0, screen_size_px.1 as f32 / 2.0),
            box_px: deg_to_px(Self::BOX_DEG),
            target_px: deg_to_px(Self::TARGET_DEG),
            fixation_px: deg_to_px(Self::FIXATION_DEG),
            stroke_default_px: deg_to_px(Self::STROKE_DEFAULT_DEG),
            stroke_cue_px: deg_to_px(Self::STROKE_CUE_DEG),
            offset_px: deg_to_px(Self::OFFSET_DEG),
        }
    }

    pub fn position(&self, location: Location) -> (f32, f32) {
        let (cx, cy) = self.centre;
        match location {
            Location::Left => (cx - self.offset_px, cy),
            Location::Centre => (cx, cy),
            Location::Right => (cx + self.offset_px, cy),
        }
    }

    pub fn placeholder(&self, cued: bool) -> StimulusType {
        let width = if cued {
            self.stroke_cue_px
        } else {
            self.stroke_default_px
        };
        StimulusType::Placeholder {
            width: self.box_px,
            stroke: Stroke {
                width,
                color: WHITE,
            },
        }
    }

    pub fn fixation(&self) -> StimulusType {
        StimulusType::FixationCross {
            size: self.fixation_px,
            thickness: self.stroke_default_px,
            rotation_deg: 0.0,
            color: WHITE,
        }
    }

    pub fn target(&self, target: TargetType) -> StimulusType {
        let rotation_deg = match target {
            TargetType::X => 45.0,
            TargetType::Plus => 0.0,
        };
        StimulusType::FixationCross {
            size: self.target_px,
            thickness: self.stroke_default_px,
            rotation_deg,
            color: WHITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub stimulus: StimulusType,
    pub position: (f32, f32),
}

/// Everything drawn on one flip, back to front.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub placements: Vec<Placement>,
}

impl Frame {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn fixation_only(layout: &StimulusLayout) -> Self {
        Self {
            placements: vec![Placement {
                stimulus: layout.fixation(),
                position: layout.position(Location::Centre),
            }],
        }
    }

    /// Placeholders and fixation, the cued box thickened when `cue` is set,
    /// plus the target when one is given.
    pub fn trial_display(
        layout: &StimulusLayout,
        cue: Option<Side>,
        target: Option<(TargetType, Side)>,
    ) -> Self {
        let mut placements = Vec::with_capacity(4);
        for side in [Side::Left, Side::Right] {
            placements.push(Placement {
                stimulus: layout.placeholder(cue == Some(side)),
                position: layout.position(side.location()),
            });
            if side == Side::Left {
                placements.push(Placement {
                    stimulus: layout.fixation(),
                    position: layout.position(Location::Centre),
                });
            }
        }
        if let Some((kind, side)) = target {
            placements.push(Placement {
                stimulus: layout.target(kind),
                position: layout.position(side.location()),
            });
        }
        Self { placements }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> StimulusLayout {
        StimulusLayout::new((1920, 1080), 40.0)
    }

    #[test]
    fn layout_converts_degrees() {
        let l = layout();
        assert_eq!(l.centre, (960.0, 540.0));
        assert_eq!(l.box_px, 80.0);
        assert_eq!(l.offset_px, 200.0);
        assert_eq!(l.position(Location::Left), (760.0, 540.0));
        assert_eq!(l.position(Location::Right), (1160.0, 540.0));
    }

    #[test]
    fn cued_display_thickens_only_cued_box() {
        let l = layout();
        let frame = Frame::trial_display(&l, Some(Side::Right), None);
        assert_eq!(frame.placements.len(), 3);
        let right = &frame.placements[2];
        assert_eq!(right.position, l.position(Location::Right));
        assert_eq!(right.stimulus, l.placeholder(true));
        assert_eq!(frame.placements[0].stimulus, l.placeholder(false));
    }

    #[test]
    fn target_is_drawn_last_at_its_side() {
        let l = layout();
        let frame = Frame::trial_display(&l, None, Some((TargetType::X, Side::Left)));
        assert_eq!(frame.placements[0].stimulus, l.placeholder(false));
        assert_eq!(frame.placements[2].stimulus, l.placeholder(false));
        let last = frame.placements.last().unwrap();
        assert_eq!(last.position, l.position(Location::Left));
        assert!(matches!(
            last.stimulus,
            StimulusType::FixationCross { rotation_deg, .. } if rotation_deg == 45.0
        ));
    }

    #[test]
    fn labels_match_record_values() {
        assert_eq!(TargetType::Plus.as_str(), "+");
        assert_eq!(serde_json::to_string(&TargetType::X).unwrap(), "\"x\"");
        assert_eq!(serde_json::to_string(&Side::Left).unwrap(), "\"left\"");
    }
}
