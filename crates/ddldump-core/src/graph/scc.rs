//! Strongly-connected components over an adjacency list.

const UNVISITED: usize = usize::MAX;

/// Compute the strongly-connected components of a directed graph.
///
/// `adjacency[v]` lists the successors of node `v`. Each returned component
/// is sorted ascending; components come out in reverse topological order of
/// the condensation (a component is emitted after every component it reaches).
///
/// Iterative Tarjan, so deep dependency chains cannot overflow the stack.
pub fn strongly_connected_components(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut frames: Vec<(usize, usize)> = Vec::new();
    let mut components = Vec::new();
    let mut next_index = 0usize;

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }

        index[root] = next_index;
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;
        frames.push((root, 0));

        while let Some(&(node, pos)) = frames.last() {
            if let Some(&next) = adjacency[node].get(pos) {
                if let Some(top) = frames.last_mut() {
                    top.1 += 1;
                }
                if index[next] == UNVISITED {
                    index[next] = next_index;
                    lowlink[next] = next_index;
                    next_index += 1;
                    stack.push(next);
                    on_stack[next] = true;
                    frames.push((next, 0));
                } else if on_stack[next] {
                    lowlink[node] = lowlink[node].min(index[next]);
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[node]);
            }

            if lowlink[node] == index[node] {
                let mut component = Vec::new();
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                component.sort_unstable();
                components.push(component);
            }
        }
    }

    components
}

/// Whether a component is a genuine cycle: more than one member, or a
/// single member that references itself.
pub fn is_cyclic(component: &[usize], adjacency: &[Vec<usize>]) -> bool {
    match component {
        [single] => adjacency[*single].contains(single),
        members => members.len() > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cyclic_components(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
        let mut found: Vec<Vec<usize>> = strongly_connected_components(adjacency)
            .into_iter()
            .filter(|c| is_cyclic(c, adjacency))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_acyclic_graph_has_singleton_components() {
        let adjacency = vec![vec![1], vec![2], vec![]];
        let components = strongly_connected_components(&adjacency);
        assert_eq!(components.len(), 3);
        assert!(cyclic_components(&adjacency).is_empty());
    }

    #[test]
    fn test_two_cycle() {
        let adjacency = vec![vec![1], vec![0], vec![0]];
        assert_eq!(cyclic_components(&adjacency), vec![vec![0, 1]]);
    }

    #[test]
    fn test_self_loop_is_cyclic() {
        let adjacency = vec![vec![0], vec![]];
        assert_eq!(cyclic_components(&adjacency), vec![vec![0]]);
    }

    #[test]
    fn test_separate_cycles() {
        // 0 <-> 1, 2 -> 3 -> 4 -> 2, 5 standalone
        let adjacency = vec![vec![1], vec![0], vec![3], vec![4], vec![2], vec![0]];
        assert_eq!(cyclic_components(&adjacency), vec![vec![0, 1], vec![2, 3, 4]]);
    }

    #[test]
    fn test_reverse_topological_emission() {
        // 0 depends on 1, 1 depends on 2.
        let adjacency = vec![vec![1], vec![2], vec![]];
        let components = strongly_connected_components(&adjacency);
        assert_eq!(components, vec![vec![2], vec![1], vec![0]]);
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let n = 100_000;
        let adjacency: Vec<Vec<usize>> = (0..n)
            .map(|i| if i + 1 < n { vec![i + 1] } else { vec![0] })
            .collect();
        let components = strongly_connected_components(&adjacency);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), n);
    }
}
