//! Minimal typed skeleton data.
//!
//! The skeletal authoring format is consumed as-is; only the topology the
//! stage needs (bone tree, slots, animation names) is lifted into types.

use crate::Error;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub struct BoneInfo {
    pub name: String,
    pub parent: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SlotInfo {
    pub name: String,
    pub bone: usize,
    pub attachment: Option<String>,
}

/// Parsed skeleton topology for one asset.
#[derive(Clone, Debug, PartialEq)]
pub struct SkeletonDoc {
    pub bones: Vec<BoneInfo>,
    pub slots: Vec<SlotInfo>,
    /// Animation names in export order; index 0 is the default clip.
    pub animations: Vec<String>,
}

#[derive(Deserialize)]
struct RawDoc {
    #[serde(default)]
    bones: Vec<RawBone>,
    #[serde(default)]
    slots: Vec<RawSlot>,
    #[serde(default)]
    animations: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawBone {
    name: String,
    #[serde(default)]
    parent: Option<String>,
}

#[derive(Deserialize)]
struct RawSlot {
    name: String,
    bone: String,
    #[serde(default)]
    attachment: Option<String>,
}

impl SkeletonDoc {
    pub fn from_json_str(asset: &str, json: &str) -> Result<Self, Error> {
        let raw: RawDoc = serde_json::from_str(json).map_err(|e| Error::SkeletonParse {
            asset: asset.to_string(),
            message: e.to_string(),
        })?;
        build_doc(raw).map_err(|message| Error::SkeletonParse {
            asset: asset.to_string(),
            message,
        })
    }

    pub fn bone(&self, name: &str) -> Option<&BoneInfo> {
        self.bones.iter().find(|b| b.name == name)
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.animations.iter().any(|a| a == name)
    }
}

fn build_doc(raw: RawDoc) -> Result<SkeletonDoc, String> {
    let mut bone_index = HashMap::new();
    for (index, bone) in raw.bones.iter().enumerate() {
        bone_index.insert(bone.name.clone(), index);
    }

    let mut bones = Vec::with_capacity(raw.bones.len());
    for bone in &raw.bones {
        let parent = match &bone.parent {
            None => None,
            Some(parent) => Some(
                *bone_index
                    .get(parent)
                    .ok_or_else(|| format!("unknown parent bone '{parent}' for bone '{}'", bone.name))?,
            ),
        };
        bones.push(BoneInfo {
            name: bone.name.clone(),
            parent,
        });
    }

    let mut slots = Vec::with_capacity(raw.slots.len());
    for slot in raw.slots {
        let bone = *bone_index
            .get(&slot.bone)
            .ok_or_else(|| format!("unknown bone '{}' for slot '{}'", slot.bone, slot.name))?;
        slots.push(SlotInfo {
            name: slot.name,
            bone,
            attachment: slot.attachment,
        });
    }

    Ok(SkeletonDoc {
        bones,
        slots,
        animations: raw.animations.keys().cloned().collect(),
    })
}
