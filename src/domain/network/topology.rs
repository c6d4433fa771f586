use std::collections::{BTreeMap, BTreeSet};

use crate::domain::network::link::{Link, LinkAction, LinkEvent};
use crate::domain::utils::id::SwitchId;

/// Read-only view of the switch graph used by the path finder.
pub trait TopologyView {
    /// All switches currently known to the controller.
    fn switches(&self) -> Vec<SwitchId>;

    /// Outgoing links of `switch`, ordered by neighbour and port numbers.
    ///
    /// Parallel links to the same neighbour are listed separately.
    fn outlinks(&self, switch: SwitchId) -> Vec<Link>;
}

/// Switch graph maintained from link up/down notifications.
///
/// Every link is directed. Discovery reports each direction of a physical cable as its
/// own event, so a bidirectional cable shows up as two entries.
#[derive(Debug, Clone, Default)]
pub struct NetworkTopology {
    /// Switches seen so far, including switches whose links have all gone down.
    switches: BTreeSet<SwitchId>,

    /// The adjacency list representing the graph structure.
    /// Maps a switch to the set of links leaving it.
    adjacency: BTreeMap<SwitchId, BTreeSet<Link>>,
}

impl NetworkTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_switch(&mut self, switch: SwitchId) {
        self.switches.insert(switch);
    }

    /// Applies a link event.
    ///
    /// # Returns
    /// `true` if the graph changed, `false` for a duplicate add or a remove of an unknown link.
    pub fn apply(&mut self, event: &LinkEvent) -> bool {
        let link = event.link();
        match event.action {
            LinkAction::Add => {
                self.switches.insert(event.src);
                self.switches.insert(event.dst);
                let added = self.adjacency.entry(event.src).or_default().insert(link);
                if !added {
                    log::debug!("DuplicateLink: {} -[{}/{}]-> {} is already known", event.src, event.sport, event.dport, event.dst);
                }
                added
            }
            LinkAction::Remove => {
                let Some(links) = self.adjacency.get_mut(&event.src) else {
                    log::debug!("UnknownLink: {} has no outgoing links, ignoring removal", event.src);
                    return false;
                };
                let removed = links.remove(&link);
                if links.is_empty() {
                    self.adjacency.remove(&event.src);
                }
                removed
            }
        }
    }

    pub fn contains_link(&self, src: SwitchId, link: &Link) -> bool {
        self.adjacency.get(&src).is_some_and(|links| links.contains(link))
    }

    /// All links from `src` to `dst`, lowest port numbers first.
    pub fn links_between(&self, src: SwitchId, dst: SwitchId) -> Vec<Link> {
        self.adjacency.get(&src).map(|links| links.iter().filter(|link| link.dst == dst).copied().collect()).unwrap_or_default()
    }

    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    pub fn link_count(&self) -> usize {
        self.adjacency.values().map(|links| links.len()).sum()
    }

    /// Iterates over every directed link together with the switch it leaves.
    pub fn links(&self) -> impl Iterator<Item = (SwitchId, &Link)> + '_ {
        self.adjacency.iter().flat_map(|(src, links)| links.iter().map(move |link| (*src, link)))
    }
}

impl TopologyView for NetworkTopology {
    fn switches(&self) -> Vec<SwitchId> {
        self.switches.iter().copied().collect()
    }

    fn outlinks(&self, switch: SwitchId) -> Vec<Link> {
        self.adjacency.get(&switch).map(|links| links.iter().copied().collect()).unwrap_or_default()
    }
}
