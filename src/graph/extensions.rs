use crate::graph::{
    amplify::Amplify,
    mix::WetDry,
    node::GraphNode,
    through::Through,
};

/// Fluent combinators so voice chains read left to right:
///
/// ```ignore
/// OscNode::sawtooth()
///     .amplify(EnvNode::one_shot(15.0, 0.8, 450.0))
///     .through(SweepFilterNode::new(1200.0, 0.7))
///     .wet_dry(ChorusNode::new(1.2, 2.5), 0.4)
/// ```
pub trait NodeExt: GraphNode + Sized {
    fn amplify<M: GraphNode>(self, modulator: M) -> Amplify<Self, M> {
        Amplify::new(self, modulator)
    }

    fn through<F: GraphNode>(self, processor: F) -> Through<Self, F> {
        Through::new(self, processor)
    }

    fn wet_dry<E: GraphNode>(self, effect: E, wetness: f32) -> Through<Self, WetDry<E>> {
        Through::new(self, WetDry::new(effect, wetness))
    }
}

impl<T: GraphNode> NodeExt for T {}
