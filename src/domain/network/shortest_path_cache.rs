use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};

use crate::domain::network::link::{Link, LinkAction, LinkEvent, Route, RouteId};
use crate::domain::utils::id::SwitchId;

/// Routes keyed by the sub-route they extend by one hop.
type ExtensionMap = HashMap<Route, Vec<Route>>;

/// Pending shortest-path candidates, popped in [`rank`] order.
#[derive(Debug, Default)]
struct CandidateQueue {
    heap: BinaryHeap<Reverse<(usize, Route)>>,
}

impl CandidateQueue {
    fn push(&mut self, route: Route) {
        self.heap.push(Reverse((route.len(), route)));
    }

    fn pop(&mut self) -> Option<Route> {
        self.heap.pop().map(|Reverse((_, route))| route)
    }
}

/// Total order among the routes of one pair: fewer hops first, then by links.
///
/// Every sub-route of a route that is least in this order is itself least for its own pair,
/// so the shortest routes of all pairs agree with each other even when lengths tie.
fn rank(route: &Route) -> (usize, &[Link]) {
    (route.len(), route.path.as_slice())
}

/// Hop-count shortest paths between every pair of switches, kept up to date link by link.
///
/// Besides the best route per pair the cache tracks every *locally shortest* route: a route
/// whose prefix (last hop trimmed) and suffix (first hop trimmed) are both the recorded
/// shortest routes of their pairs. Single hops are always locally shortest. New shortest
/// routes are only ever built by extending a recorded shortest route by one hop, so a link
/// event touches the pairs it affects instead of triggering an all-pairs recomputation
/// (Demetrescu & Italiano, "A New Approach to Dynamic All Pairs Shortest Paths").
///
/// Routes of equal length are told apart by `rank`. Without a consistent tie-break a pair
/// can lose every local route after a removal while a path still exists.
///
/// Invariants:
/// * every route in `shortest` or in an extension map is also in `local_routes`;
/// * `local_routes` lists are sorted by `rank`, and the shortest route of a pair is the first.
#[derive(Debug, Clone, Default)]
pub struct ShortestPathCache {
    /// Best known route per pair.
    shortest: BTreeMap<RouteId, Route>,

    /// All locally shortest routes per pair, least `rank` first.
    local_routes: BTreeMap<RouteId, Vec<Route>>,

    /// `left_local[sub]`: local routes made by adding one hop in front of `sub`.
    left_local: ExtensionMap,
    /// Same as `left_local`, restricted to routes that are currently shortest.
    left_shortest: ExtensionMap,

    /// `right_local[sub]`: local routes made by adding one hop after the end of `sub`.
    right_local: ExtensionMap,
    /// Same as `right_local`, restricted to routes that are currently shortest.
    right_shortest: ExtensionMap,
}

impl ShortestPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best known route between the two switches of `id`.
    pub fn shortest(&self, id: &RouteId) -> Option<&Route> {
        self.shortest.get(id)
    }

    /// All pairs with a known route.
    pub fn shortest_routes(&self) -> impl Iterator<Item = &Route> + '_ {
        self.shortest.values()
    }

    /// Locally shortest routes of a pair, least `rank` first.
    pub fn local_routes(&self, id: &RouteId) -> &[Route] {
        self.local_routes.get(id).map(|routes| routes.as_slice()).unwrap_or(&[])
    }

    /// Number of connected pairs.
    pub fn len(&self) -> usize {
        self.shortest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortest.is_empty()
    }

    pub fn apply(&mut self, event: &LinkEvent) -> bool {
        match event.action {
            LinkAction::Add => self.add_link(event.src, event.link()),
            LinkAction::Remove => self.remove_link(event.src, event.link()),
        }
    }

    /// Registers a new link and propagates the shortest routes it creates.
    ///
    /// # Returns
    /// `false` if the link was already known.
    pub fn add_link(&mut self, src: SwitchId, link: Link) -> bool {
        let route = Route::single_hop(src, link);
        if self.is_local(&route) {
            log::debug!("Link {} already cached, ignoring add", route);
            return false;
        }

        self.add_local(route.clone());
        add_extension(&mut self.left_local, Route::empty(link.dst), route.clone());
        add_extension(&mut self.right_local, Route::empty(src), route.clone());

        let mut candidates = CandidateQueue::default();
        candidates.push(route);
        self.fixup(candidates, false);
        true
    }

    /// Drops a link together with every cached route built on it, then rediscovers
    /// replacement routes for the pairs that lost theirs.
    ///
    /// # Returns
    /// `false` if the link was not known.
    pub fn remove_link(&mut self, src: SwitchId, link: Link) -> bool {
        let route = Route::single_hop(src, link);
        if !self.is_local(&route) {
            log::debug!("Link {} not cached, ignoring remove", route);
            return false;
        }

        self.cleanup(&route, true);
        self.fixup(CandidateQueue::default(), true);
        true
    }

    /// Checks the structural invariants. Meant for tests and debug assertions.
    pub fn is_consistent(&self) -> bool {
        let shortest_ok = self.shortest.values().all(|route| self.is_local(route));
        let extensions_ok = [&self.left_local, &self.left_shortest, &self.right_local, &self.right_shortest]
            .iter()
            .all(|map| map.values().flatten().all(|route| self.is_local(route)));
        let sorted_ok = self.local_routes.values().all(|routes| routes.windows(2).all(|pair| rank(&pair[0]) <= rank(&pair[1])));
        let least_ok = self.shortest.values().all(|route| self.local_routes(&route.id).first() == Some(route));
        shortest_ok && extensions_ok && sorted_ok && least_ok
    }

    /// Removes `route` from `shortest`, and from `local_routes` too when `delete_route` is set,
    /// then removes every local route that extends it, transitively.
    fn cleanup(&mut self, route: &Route, delete_route: bool) {
        let is_short = remove_if_shortest(&mut self.shortest, route);
        if delete_route {
            self.remove_local(route);
        }

        let prefix = route.without_last();
        if delete_route {
            remove_extension(&mut self.right_local, &prefix, route);
        }
        if is_short {
            remove_extension(&mut self.right_shortest, &prefix, route);
        }

        let suffix = route.without_first();
        if delete_route {
            remove_extension(&mut self.left_local, &suffix, route);
        }
        if is_short {
            remove_extension(&mut self.left_shortest, &suffix, route);
        }

        let mut to_clean: BTreeSet<Route> = BTreeSet::new();
        let mut subpath = route.clone();
        loop {
            let left = self.left_local.remove(&subpath).unwrap_or_default();
            self.left_shortest.remove(&subpath);
            let right = self.right_local.remove(&subpath).unwrap_or_default();
            self.right_shortest.remove(&subpath);

            for extension in left {
                self.clean_extension(&extension, true);
                to_clean.insert(extension);
            }
            for extension in right {
                self.clean_extension(&extension, false);
                to_clean.insert(extension);
            }

            match to_clean.pop_first() {
                Some(next) => subpath = next,
                None => break,
            }
        }
    }

    /// Forgets a local route whose sub-route on one side is gone. The entry under that
    /// side has already been dropped; this removes the one under its other side.
    fn clean_extension(&mut self, extension: &Route, extends_left: bool) {
        if !self.remove_local(extension) {
            return;
        }
        let is_short = remove_if_shortest(&mut self.shortest, extension);

        if extends_left {
            let prefix = extension.without_last();
            remove_extension(&mut self.right_local, &prefix, extension);
            if is_short {
                remove_extension(&mut self.right_shortest, &prefix, extension);
            }
        } else {
            let suffix = extension.without_first();
            remove_extension(&mut self.left_local, &suffix, extension);
            if is_short {
                remove_extension(&mut self.left_shortest, &suffix, extension);
            }
        }
    }

    /// Promotes candidates to shortest routes, shortest first, and queues the one-hop
    /// extensions each promotion makes locally shortest.
    ///
    /// With `add_least` the queue is first seeded with the best surviving local route of
    /// every pair, which is how pairs that lost their route during cleanup are repaired.
    fn fixup(&mut self, mut candidates: CandidateQueue, add_least: bool) {
        if add_least {
            for routes in self.local_routes.values() {
                if let Some(least) = routes.first() {
                    candidates.push(least.clone());
                }
            }
        }

        while let Some(route) = candidates.pop() {
            // Dropped by a cleanup after it was queued.
            if !self.is_local(&route) {
                continue;
            }

            if let Some(old) = self.shortest.get(&route.id) {
                if rank(old) <= rank(&route) {
                    continue;
                }
                let old = old.clone();
                self.cleanup(&old, false);
            } else if route.id.src == route.id.dst {
                continue;
            }

            let prefix = route.without_last();
            let suffix = route.without_first();
            self.shortest.insert(route.id, route.clone());
            add_extension(&mut self.left_shortest, suffix.clone(), route.clone());
            add_extension(&mut self.right_shortest, prefix.clone(), route.clone());
            self.add_local_routes(&route, &prefix, &suffix, &mut candidates);
        }
    }

    /// Combines a newly shortest `route` with the shortest routes that overlap it in all
    /// but one hop, creating the routes one hop longer on either end.
    fn add_local_routes(&mut self, route: &Route, prefix: &Route, suffix: &Route, candidates: &mut CandidateQueue) {
        let in_front = self.left_shortest.get(prefix).cloned().unwrap_or_default();
        for other in in_front {
            let Some(first) = other.path.first() else {
                continue;
            };
            let new_local = route.prepend(other.id.src, *first);
            if self.is_local(&new_local) {
                continue;
            }
            self.add_local(new_local.clone());
            add_extension(&mut self.left_local, route.clone(), new_local.clone());
            add_extension(&mut self.right_local, other, new_local.clone());
            candidates.push(new_local);
        }

        let behind = self.right_shortest.get(suffix).cloned().unwrap_or_default();
        for other in behind {
            let Some(last) = other.path.last() else {
                continue;
            };
            let new_local = route.append(*last);
            if self.is_local(&new_local) {
                continue;
            }
            self.add_local(new_local.clone());
            add_extension(&mut self.left_local, other, new_local.clone());
            add_extension(&mut self.right_local, route.clone(), new_local.clone());
            candidates.push(new_local);
        }
    }

    fn is_local(&self, route: &Route) -> bool {
        self.local_routes.get(&route.id).is_some_and(|routes| routes.contains(route))
    }

    /// Inserts in [`rank`] order.
    fn add_local(&mut self, route: Route) {
        let routes = self.local_routes.entry(route.id).or_default();
        let index = routes.iter().position(|r| rank(r) > rank(&route)).unwrap_or(routes.len());
        routes.insert(index, route);
    }

    fn remove_local(&mut self, route: &Route) -> bool {
        let Some(routes) = self.local_routes.get_mut(&route.id) else {
            return false;
        };
        let Some(index) = routes.iter().position(|r| r == route) else {
            return false;
        };
        routes.remove(index);
        if routes.is_empty() {
            self.local_routes.remove(&route.id);
        }
        true
    }
}

fn remove_if_shortest(shortest: &mut BTreeMap<RouteId, Route>, route: &Route) -> bool {
    if shortest.get(&route.id) == Some(route) {
        shortest.remove(&route.id);
        return true;
    }
    false
}

fn add_extension(map: &mut ExtensionMap, subpath: Route, route: Route) {
    map.entry(subpath).or_default().push(route);
}

fn remove_extension(map: &mut ExtensionMap, subpath: &Route, route: &Route) -> bool {
    let Some(routes) = map.get_mut(subpath) else {
        return false;
    };
    let Some(index) = routes.iter().position(|r| r == route) else {
        return false;
    };
    routes.remove(index);
    if routes.is_empty() {
        map.remove(subpath);
    }
    true
}
