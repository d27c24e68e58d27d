//! Material graph synthesis.
//!
//! Builds one [`NodeGraph`] from a resolved [`MaterialPlan`]:
//!
//! - root material -> material output, plus one shared transform node
//! - one image texture per channel, wired from the transform
//! - Ambient Occlusion multiplied into Albedo (dropped without Albedo)
//! - Displacement and Emission routed through wrapper nodes
//! - Bump/Displacement root links pruned to the preferred one
//!
//! Positions come from a fixed table so repeated runs lay out identically.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::channel::{Channel, ImageFile};
use crate::core::classify::MaterialPlan;
use crate::core::graph::{GraphError, Node, NodeGraph, NodeId, NodeKind, ParamValue, Position, Socket};

/// Horizontal spacing unit of the layout table
const GAP: f32 = 300.0;

/// Vertical step between stacked Albedo alternates
const ALT_STEP: f32 = 250.0;

/// Which of Bump and Displacement keeps its root link when both exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceDetail
{
    /// Keep both links
    Both,
    #[default]
    Bump,
    Displacement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GammaConfig
{
    /// Gamma for color channels (albedo, emission, ...)
    pub color: f32,
    /// Gamma for data channels (roughness, normal, ...)
    pub data: f32,
}

impl Default for GammaConfig
{
    fn default() -> Self
    {
        Self { color: 2.2, data: 1.0 }
    }
}

impl GammaConfig
{
    pub fn for_channel(
        &self,
        channel: Channel,
    ) -> f32
    {
        if channel.is_color() { self.color } else { self.data }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplacementConfig
{
    pub mid_level: f32,
    pub height: f32,
}

impl Default for DisplacementConfig
{
    fn default() -> Self
    {
        Self { mid_level: 0.5, height: 0.1 }
    }
}

/// The synthesis half of the settings bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthSettings
{
    pub surface_detail: SurfaceDetail,
    pub gamma: GammaConfig,
    pub displacement: DisplacementConfig,
}

/// Layout slots with a fixed position each.
#[derive(Debug, Clone, Copy)]
enum Slot
{
    Output,
    Transform,
    Root,
    Texture(Channel),
    Multiply,
    DisplacementWrapper,
    EmissionWrapper,
}

fn position(slot: Slot) -> Position
{
    match slot
    {
        Slot::Output => Position::new(GAP, 0.0),
        Slot::Transform => Position::new(-GAP * 5.0, 50.0),
        Slot::Root => Position::new(0.0, 150.0),
        Slot::Multiply => Position::new(-GAP, 100.0),
        Slot::DisplacementWrapper => Position::new(-GAP, -1100.0),
        Slot::EmissionWrapper => Position::new(-GAP, -1350.0),
        Slot::Texture(channel) => match channel
        {
            Channel::Transmission => Position::new(-GAP, 500.0),
            Channel::Albedo => Position::new(-GAP * 2.0, 150.0),
            Channel::AmbientOcclusion => Position::new(-GAP * 2.0, -50.0),
            Channel::Metallic => Position::new(-GAP * 3.0, -300.0),
            Channel::Specular => Position::new(-GAP * 2.0, -250.0),
            Channel::Roughness => Position::new(-GAP, -300.0),
            Channel::Opacity => Position::new(-GAP * 3.0, -700.0),
            Channel::Bump => Position::new(-GAP * 2.0, -650.0),
            Channel::Normal => Position::new(-GAP, -700.0),
            Channel::Displacement => Position::new(-GAP * 2.0, -1050.0),
            Channel::Emission => Position::new(-GAP * 2.0, -1450.0),
        },
    }
}

/// Builder state shared by the per-channel steps.
struct Builder<'a>
{
    graph: NodeGraph,
    root: NodeId,
    transform: NodeId,
    settings: &'a SynthSettings,
}

impl Builder<'_>
{
    /// Add an image texture node fed by the shared transform.
    fn texture(
        &mut self,
        channel: Channel,
        file: &ImageFile,
        label: String,
        pos: Position,
        muted: bool,
    ) -> Result<NodeId, GraphError>
    {
        let node = Node::new(NodeKind::ImageTexture, label, pos)
            .with_param("channel", ParamValue::Text(channel.id().to_string()))
            .with_param(
                "path",
                ParamValue::Text(
                    file.path
                        .to_string_lossy()
                        .into_owned(),
                ),
            )
            .with_param(
                "gamma",
                ParamValue::Float(
                    self.settings
                        .gamma
                        .for_channel(channel),
                ),
            )
            .with_param("muted", ParamValue::Bool(muted));
        let id = self.graph.add_node(node);
        self.graph
            .connect(self.transform, Socket::TransformOut, id, Socket::Transform)?;
        Ok(id)
    }

    fn primary_texture(
        &mut self,
        channel: Channel,
        file: &ImageFile,
    ) -> Result<NodeId, GraphError>
    {
        self.texture(
            channel,
            file,
            channel.label().to_string(),
            position(Slot::Texture(channel)),
            false,
        )
    }

    fn to_root(
        &mut self,
        from: NodeId,
        socket: Socket,
        channel: Channel,
    ) -> Result<(), GraphError>
    {
        self.graph
            .connect(from, socket, self.root, Socket::Input(channel))
    }
}

/// Build the node graph for one material.
pub fn synthesize(
    name: &str,
    plan: &MaterialPlan,
    settings: &SynthSettings,
) -> Result<NodeGraph, GraphError>
{
    let mut graph = NodeGraph::new();
    let root = graph.add_node(Node::new(NodeKind::UniversalMaterial, name, position(Slot::Root)));
    let output = graph.add_node(Node::new(
        NodeKind::MaterialOutput,
        "Material Output",
        position(Slot::Output),
    ));
    let transform = graph.add_node(Node::new(
        NodeKind::Transform3D,
        "Transform",
        position(Slot::Transform),
    ));
    graph.connect(root, Socket::MaterialOut, output, Socket::Surface)?;

    let mut b = Builder { graph, root, transform, settings };

    for (&channel, pick) in &plan.channels
    {
        match channel
        {
            Channel::AmbientOcclusion =>
            {
                // wired together with Albedo below
            }
            Channel::Albedo =>
            {
                let albedo = b.primary_texture(channel, &pick.primary)?;

                match plan
                    .channels
                    .get(&Channel::AmbientOcclusion)
                {
                    Some(ao_pick) =>
                    {
                        let ao = b.primary_texture(Channel::AmbientOcclusion, &ao_pick.primary)?;
                        let multiply = b.graph.add_node(Node::new(
                            NodeKind::MultiplyTexture,
                            "Albedo x AO",
                            position(Slot::Multiply),
                        ));
                        b.graph
                            .connect(albedo, Socket::TextureOut, multiply, Socket::Texture1)?;
                        b.graph
                            .connect(ao, Socket::TextureOut, multiply, Socket::Texture2)?;
                        b.to_root(multiply, Socket::TextureOut, channel)?;
                    }
                    None => b.to_root(albedo, Socket::TextureOut, channel)?,
                }

                let base = position(Slot::Texture(channel));
                for (i, alt) in pick
                    .alternates
                    .iter()
                    .enumerate()
                {
                    let n = i + 1;
                    b.texture(
                        channel,
                        alt,
                        format!("{} Alt-{n}", channel.label()),
                        base.offset(0.0, ALT_STEP * n as f32),
                        true,
                    )?;
                }
            }
            Channel::Displacement =>
            {
                let tex = b.primary_texture(channel, &pick.primary)?;
                let wrapper = b.graph.add_node(
                    Node::new(
                        NodeKind::TextureDisplacement,
                        "Displacement",
                        position(Slot::DisplacementWrapper),
                    )
                    .with_param(
                        "mid_level",
                        ParamValue::Float(settings.displacement.mid_level),
                    )
                    .with_param("height", ParamValue::Float(settings.displacement.height)),
                );
                b.graph
                    .connect(tex, Socket::TextureOut, wrapper, Socket::Texture)?;
                b.to_root(wrapper, Socket::DisplacementOut, channel)?;
            }
            Channel::Emission =>
            {
                let tex = b.primary_texture(channel, &pick.primary)?;
                let wrapper = b.graph.add_node(Node::new(
                    NodeKind::TextureEmission,
                    "Emission",
                    position(Slot::EmissionWrapper),
                ));
                b.graph
                    .connect(tex, Socket::TextureOut, wrapper, Socket::Texture)?;
                b.to_root(wrapper, Socket::EmissionOut, channel)?;
            }
            _ =>
            {
                let tex = b.primary_texture(channel, &pick.primary)?;
                b.to_root(tex, Socket::TextureOut, channel)?;
            }
        }
    }

    if plan
        .channels
        .contains_key(&Channel::AmbientOcclusion)
        && !plan
            .channels
            .contains_key(&Channel::Albedo)
    {
        debug!(material = name, "ambient occlusion without albedo dropped");
    }

    let mut graph = b.graph;
    prune_surface_detail(&mut graph, root, settings.surface_detail);
    Ok(graph)
}

/// Drop the losing Bump/Displacement root link when both are wired.
/// The loser's nodes stay in the graph.
fn prune_surface_detail(
    graph: &mut NodeGraph,
    root: NodeId,
    preference: SurfaceDetail,
)
{
    let bump = Socket::Input(Channel::Bump);
    let disp = Socket::Input(Channel::Displacement);
    let both = graph
        .input_link(root, bump)
        .is_some()
        && graph
            .input_link(root, disp)
            .is_some();
    if !both
    {
        return;
    }

    let loser = match preference
    {
        SurfaceDetail::Both => return,
        SurfaceDetail::Bump => disp,
        SurfaceDetail::Displacement => bump,
    };
    graph.disconnect_input(root, loser);
}

#[cfg(test)]
mod tests
{
    use std::path::PathBuf;

    use super::*;
    use crate::core::classify::ChannelPick;

    fn pick(name: &str) -> ChannelPick
    {
        ChannelPick {
            primary: ImageFile {
                path: PathBuf::from("/lib/m").join(name),
                relative: PathBuf::from("m").join(name),
                size_bytes: 1,
            },
            alternates: Vec::new(),
        }
    }

    fn plan(channels: &[(Channel, &str)]) -> MaterialPlan
    {
        MaterialPlan {
            suffix: None,
            channels: channels
                .iter()
                .map(|(c, n)| (*c, pick(n)))
                .collect(),
        }
    }

    fn root_source(
        g: &NodeGraph,
        channel: Channel,
    ) -> Option<&Node>
    {
        g.input_link(0, Socket::Input(channel))
            .and_then(|c| g.node(c.from_node))
    }

    #[test]
    fn empty_plan_has_only_fixed_nodes()
    {
        let g = synthesize("M", &MaterialPlan::default(), &SynthSettings::default()).unwrap();
        assert_eq!(g.nodes.len(), 3);
        assert_eq!(g.connections.len(), 1);
        assert_eq!(g.nodes[0].kind, NodeKind::UniversalMaterial);
        assert_eq!(g.nodes[0].label, "M");
    }

    #[test]
    fn plain_channels_wire_straight_to_root()
    {
        let p = plan(&[
            (Channel::Albedo, "a.png"),
            (Channel::Roughness, "r.png"),
            (Channel::Normal, "n.png"),
        ]);
        let g = synthesize("M", &p, &SynthSettings::default()).unwrap();
        for ch in [Channel::Albedo, Channel::Roughness, Channel::Normal]
        {
            let src = root_source(&g, ch).expect("linked");
            assert_eq!(src.kind, NodeKind::ImageTexture);
            assert_eq!(src.label, ch.label());
            assert!(g.input_link(src.id, Socket::Transform).is_some());
        }
        // output + 3 channels + 3 transform links
        assert_eq!(g.connections.len(), 7);
    }

    #[test]
    fn gamma_follows_channel_kind()
    {
        let p = plan(&[(Channel::Albedo, "a.png"), (Channel::Roughness, "r.png")]);
        let g = synthesize("M", &p, &SynthSettings::default()).unwrap();
        assert_eq!(
            root_source(&g, Channel::Albedo).unwrap().param("gamma"),
            Some(&ParamValue::Float(2.2))
        );
        assert_eq!(
            root_source(&g, Channel::Roughness).unwrap().param("gamma"),
            Some(&ParamValue::Float(1.0))
        );
    }

    #[test]
    fn ambient_occlusion_multiplies_into_albedo()
    {
        let p = plan(&[(Channel::Albedo, "a.png"), (Channel::AmbientOcclusion, "ao.png")]);
        let g = synthesize("M", &p, &SynthSettings::default()).unwrap();
        let src = root_source(&g, Channel::Albedo).unwrap();
        assert_eq!(src.kind, NodeKind::MultiplyTexture);
        assert!(g.input_link(src.id, Socket::Texture1).is_some());
        assert!(g.input_link(src.id, Socket::Texture2).is_some());
    }

    #[test]
    fn ambient_occlusion_without_albedo_is_dropped()
    {
        let p = plan(&[(Channel::AmbientOcclusion, "ao.png")]);
        let g = synthesize("M", &p, &SynthSettings::default()).unwrap();
        assert_eq!(g.nodes.len(), 3);
    }

    #[test]
    fn displacement_and_emission_use_wrappers()
    {
        let p = plan(&[(Channel::Displacement, "d.png"), (Channel::Emission, "e.png")]);
        let g = synthesize("M", &p, &SynthSettings::default()).unwrap();

        let disp = root_source(&g, Channel::Displacement).unwrap();
        assert_eq!(disp.kind, NodeKind::TextureDisplacement);
        assert_eq!(disp.param("mid_level"), Some(&ParamValue::Float(0.5)));
        assert_eq!(disp.param("height"), Some(&ParamValue::Float(0.1)));

        let emit = root_source(&g, Channel::Emission).unwrap();
        assert_eq!(emit.kind, NodeKind::TextureEmission);
        let tex = g
            .input_link(emit.id, Socket::Texture)
            .and_then(|c| g.node(c.from_node))
            .unwrap();
        assert_eq!(tex.kind, NodeKind::ImageTexture);
    }

    #[test]
    fn displacement_preference_unlinks_bump()
    {
        let p = plan(&[(Channel::Bump, "b.png"), (Channel::Displacement, "d.png")]);
        let settings = SynthSettings {
            surface_detail: SurfaceDetail::Displacement,
            ..SynthSettings::default()
        };
        let g = synthesize("M", &p, &settings).unwrap();
        assert!(root_source(&g, Channel::Bump).is_none());
        assert!(root_source(&g, Channel::Displacement).is_some());
        assert!(
            g.nodes_of_kind(NodeKind::ImageTexture)
                .any(|n| n.label == "Bump")
        );
    }

    #[test]
    fn bump_preference_unlinks_displacement_and_both_keeps_all()
    {
        let p = plan(&[(Channel::Bump, "b.png"), (Channel::Displacement, "d.png")]);
        let g = synthesize("M", &p, &SynthSettings::default()).unwrap();
        assert!(root_source(&g, Channel::Displacement).is_none());
        assert!(g.nodes_of_kind(NodeKind::TextureDisplacement).count() == 1);

        let both = SynthSettings { surface_detail: SurfaceDetail::Both, ..SynthSettings::default() };
        let g = synthesize("M", &p, &both).unwrap();
        assert!(root_source(&g, Channel::Bump).is_some());
        assert!(root_source(&g, Channel::Displacement).is_some());
    }

    #[test]
    fn albedo_alternates_are_muted_and_stacked()
    {
        let mut p = plan(&[(Channel::Albedo, "a.png")]);
        if let Some(albedo) = p.channels.get_mut(&Channel::Albedo)
        {
            albedo.alternates = vec![pick("b.png").primary, pick("c.png").primary];
        }
        let g = synthesize("M", &p, &SynthSettings::default()).unwrap();

        let textures: Vec<&Node> = g.nodes_of_kind(NodeKind::ImageTexture).collect();
        assert_eq!(textures.len(), 3);
        assert_eq!(textures[1].label, "Albedo Alt-1");
        assert_eq!(textures[1].param("muted"), Some(&ParamValue::Bool(true)));
        assert!(textures[2].position.y > textures[1].position.y);
        assert_eq!(root_source(&g, Channel::Albedo).unwrap().id, textures[0].id);
    }

    #[test]
    fn layout_is_reproducible()
    {
        let p = plan(&[(Channel::Albedo, "a.png"), (Channel::Normal, "n.png")]);
        let a = synthesize("M", &p, &SynthSettings::default()).unwrap();
        let b = synthesize("M", &p, &SynthSettings::default()).unwrap();
        assert_eq!(a, b);
    }
}
