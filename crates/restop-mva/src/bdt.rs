use std::{
    fs::File,
    io::{BufReader, BufWriter},
};

use restop_core::{Discriminant, RestopError, RestopResult};
use serde::{Deserialize, Serialize};

use crate::expand_path;

/// A small TMVA weight file with two gradient-boosted trees over the $`W`$- and top-candidate
/// masses. It is used by [`test_bdt`] and throughout the test suites.
pub const TEST_WEIGHTS: &str = r#"<?xml version="1.0"?>
<MethodSetup Method="BDT::BDT">
  <GeneralInfo>
    <Info name="TMVA Release" value="4.2.1 [262657]"/>
    <Info name="Creator" value="restop"/>
  </GeneralInfo>
  <Options>
    <Option name="NTrees" modified="Yes">2</Option>
    <Option name="BoostType" modified="Yes">Grad</Option>
    <Option name="UseYesNoLeaf" modified="No">True</Option>
  </Options>
  <Variables NVar="2">
    <Variable VarIndex="0" Expression="var_wcand_mass" Label="var_wcand_mass" Title="var_wcand_mass" Unit="" Internal="var_wcand_mass" Type="F" Min="0.0" Max="500.0"/>
    <Variable VarIndex="1" Expression="var_topcand_mass" Label="var_topcand_mass" Title="var_topcand_mass" Unit="" Internal="var_topcand_mass" Type="F" Min="0.0" Max="1000.0"/>
  </Variables>
  <Spectators NSpec="0"/>
  <Classes NClass="2">
    <Class Name="Signal" Index="0"/>
    <Class Name="Background" Index="1"/>
  </Classes>
  <Transformations NTransformations="0"/>
  <MVAPdfs/>
  <Weights NTrees="2" AnalysisType="0">
    <BinaryTree type="DecisionTree" boostWeight="1.0000000000000000e+00" itree="0">
      <Node pos="s" depth="0" NCoef="0" IVar="0" Cut="6.0000000000000000e+01" cType="1" res="0.0000000000000000e+00" rms="0.0000000000000000e+00" purity="5.0000000000000000e-01" nType="0">
        <Node pos="l" depth="1" NCoef="0" IVar="-1" Cut="0.0000000000000000e+00" cType="1" res="-5.0000000000000000e-01" rms="0.0000000000000000e+00" purity="1.0000000000000001e-01" nType="-1"/>
        <Node pos="r" depth="1" NCoef="0" IVar="1" Cut="1.5000000000000000e+02" cType="1" res="0.0000000000000000e+00" rms="0.0000000000000000e+00" purity="6.0000000000000000e-01" nType="0">
          <Node pos="l" depth="2" NCoef="0" IVar="-1" Cut="0.0000000000000000e+00" cType="1" res="-2.0000000000000001e-01" rms="0.0000000000000000e+00" purity="2.9999999999999999e-01" nType="-1"/>
          <Node pos="r" depth="2" NCoef="0" IVar="-1" Cut="0.0000000000000000e+00" cType="1" res="5.9999999999999998e-01" rms="0.0000000000000000e+00" purity="9.0000000000000002e-01" nType="1"/>
        </Node>
      </Node>
    </BinaryTree>
    <BinaryTree type="DecisionTree" boostWeight="1.0000000000000000e+00" itree="1">
      <Node pos="s" depth="0" NCoef="0" IVar="1" Cut="2.0000000000000000e+02" cType="1" res="0.0000000000000000e+00" rms="0.0000000000000000e+00" purity="5.0000000000000000e-01" nType="0">
        <Node pos="l" depth="1" NCoef="0" IVar="-1" Cut="0.0000000000000000e+00" cType="1" res="2.9999999999999999e-01" rms="0.0000000000000000e+00" purity="6.9999999999999996e-01" nType="1"/>
        <Node pos="r" depth="1" NCoef="0" IVar="-1" Cut="0.0000000000000000e+00" cType="1" res="-4.0000000000000002e-01" rms="0.0000000000000000e+00" purity="2.0000000000000001e-01" nType="-1"/>
      </Node>
    </BinaryTree>
  </Weights>
</MethodSetup>
"#;

/// A [`Bdt`] that can be used to test the tagger. It is parsed from [`TEST_WEIGHTS`] and
/// peaks for candidates with $`m_W > 60`$ GeV and $`150 \le m_t < 200`$ GeV.
pub fn test_bdt() -> Bdt {
    Bdt::from_tmva_str(TEST_WEIGHTS, "BDT").expect("Test weights should be valid")
}

/// How the outputs of the individual trees are combined into the final score.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoostType {
    /// Gradient boosting: the leaf responses are summed and mapped onto $`[-1, 1]`$ with
    /// $`2 / (1 + e^{-2s}) - 1`$.
    Grad,
    /// Any weighted-vote boosting (AdaBoost and friends): the boost-weighted average of each
    /// tree's leaf, where the leaf contributes its node type ($`\pm 1`$) if `yes_no_leaf` is set
    /// and its signal purity otherwise.
    Weighted {
        /// Use the signal/background classification of the leaf rather than its purity
        yes_no_leaf: bool,
    },
}

/// A terminal node of a [`DecisionTree`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    /// Regression response (used by gradient boosting)
    pub response: f64,
    /// Fraction of signal in the node
    pub purity: f64,
    /// `1` for signal leaves, `-1` for background leaves
    pub node_type: i32,
}

/// A node of a [`DecisionTree`]. Child nodes are referenced by their index in the tree's node
/// list and always come after their parent.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// An internal node which sends an event right if `(x[variable] >= cut) == cut_type`. The
    /// comparison is made in single precision, the precision TMVA trains and stores cuts in.
    Split {
        /// Index of the input variable
        variable: usize,
        /// Cut value
        cut: f64,
        /// `true` if values above the cut go right
        cut_type: bool,
        /// Index of the left child
        left: usize,
        /// Index of the right child
        right: usize,
    },
    /// A terminal node.
    Leaf(Leaf),
}

/// A single binary decision tree, stored as a flat list of [`Node`]s whose first entry is the
/// root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    boost_weight: f64,
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Construct a tree from its boost weight and nodes (root first).
    pub fn new(boost_weight: f64, nodes: Vec<Node>) -> Self {
        Self {
            boost_weight,
            nodes,
        }
    }

    /// The weight of this tree in a weighted vote.
    pub fn boost_weight(&self) -> f64 {
        self.boost_weight
    }

    /// The nodes of the tree, root first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Follow the cuts from the root down to the leaf which `features` falls into.
    ///
    /// Both the feature and the cut are rounded to `f32` before they are compared, so a value
    /// which only differs from a cut beyond single precision lands on the same side as it
    /// would in TMVA.
    ///
    /// # Panics
    ///
    /// Panics if the tree cuts on a variable index which is out of range for `features`, or if
    /// the tree has not passed validation (every tree owned by a [`Bdt`] has).
    pub fn leaf(&self, features: &[f64]) -> &Leaf {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Split {
                    variable,
                    cut,
                    cut_type,
                    left,
                    right,
                } => {
                    let goes_right = (features[*variable] as f32 >= *cut as f32) == *cut_type;
                    index = if goes_right { *right } else { *left };
                }
                Node::Leaf(leaf) => return leaf,
            }
        }
    }

    fn validate(&self, n_variables: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        if !self.boost_weight.is_finite() {
            return Err(format!("non-finite boost weight {}", self.boost_weight));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf(leaf) => {
                    if !leaf.response.is_finite() || !leaf.purity.is_finite() {
                        return Err(format!("leaf {index} has a non-finite response or purity"));
                    }
                }
                Node::Split {
                    variable,
                    cut,
                    left,
                    right,
                    ..
                } => {
                    if *variable >= n_variables {
                        return Err(format!(
                            "node {index} cuts on variable {variable} but only {n_variables} are defined"
                        ));
                    }
                    if !cut.is_finite() {
                        return Err(format!("node {index} has a non-finite cut"));
                    }
                    for child in [left, right] {
                        if *child <= index || *child >= self.nodes.len() {
                            return Err(format!("node {index} has an invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// A boosted decision tree discriminant.
///
/// The forest is immutable once loaded: evaluation never changes it, so a [`Bdt`] can be
/// wrapped in an [`Arc`](std::sync::Arc) and shared by every thread that tags events.
///
/// # Examples
/// ```rust
/// use restop_core::Discriminant;
/// use restop_mva::test_bdt;
///
/// let bdt = test_bdt();
/// assert_eq!(bdt.variables(), ["var_wcand_mass", "var_topcand_mass"]);
/// let score = bdt.evaluate(&[80.0, 175.0]).unwrap();
/// assert!(score > 0.7);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bdt {
    name: String,
    variables: Vec<String>,
    boost_type: BoostType,
    trees: Vec<DecisionTree>,
}

impl Bdt {
    /// Construct a [`Bdt`] from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`RestopError::ModelFormat`] if the forest is empty, a tree is empty, a split
    /// refers to an undefined variable, or a child index does not point further down the tree.
    /// Cuts, leaf values, and boost weights must also be finite.
    pub fn new(
        name: &str,
        variables: Vec<String>,
        boost_type: BoostType,
        trees: Vec<DecisionTree>,
    ) -> RestopResult<Self> {
        let bdt = Self {
            name: name.to_string(),
            variables,
            boost_type,
            trees,
        };
        bdt.validate()?;
        Ok(bdt)
    }

    fn validate(&self) -> RestopResult<()> {
        let invalid = |reason: String| RestopError::ModelFormat {
            model: self.name.clone(),
            reason,
        };
        if self.variables.is_empty() {
            return Err(invalid("no input variables".to_string()));
        }
        if self.trees.is_empty() {
            return Err(invalid("no trees".to_string()));
        }
        for (itree, tree) in self.trees.iter().enumerate() {
            tree.validate(self.variables.len())
                .map_err(|reason| invalid(format!("tree {itree}: {reason}")))?;
        }
        Ok(())
    }

    /// Read a TMVA BDT weight file. The path may contain `~` and environment variables.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not well-formed XML, or does not describe a
    /// supported classification forest.
    pub fn from_tmva_xml(file_path: &str, name: &str) -> RestopResult<Self> {
        let path = expand_path(file_path)?;
        let text = std::fs::read_to_string(path)?;
        Self::from_tmva_str(&text, name)
    }

    /// Parse the contents of a TMVA BDT weight file.
    ///
    /// # Errors
    ///
    /// See [`Bdt::from_tmva_xml`].
    pub fn from_tmva_str(text: &str, name: &str) -> RestopResult<Self> {
        crate::tmva::parse_weights(text, name)
    }

    /// Write the parsed forest to a binary cache which [`Bdt::load`] can read back.
    pub fn save(&self, file_path: &str) -> RestopResult<()> {
        let path = expand_path(file_path)?;
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())?;
        Ok(())
    }

    /// Read a forest written by [`Bdt::save`].
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or decoded, or if the decoded forest is inconsistent.
    pub fn load(file_path: &str) -> RestopResult<Self> {
        let path = expand_path(file_path)?;
        let mut reader = BufReader::new(File::open(path)?);
        let bdt: Bdt =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())?;
        bdt.validate()?;
        Ok(bdt)
    }

    /// How tree outputs are combined.
    pub fn boost_type(&self) -> BoostType {
        self.boost_type
    }

    /// The number of trees in the forest.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// The trees of the forest.
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl Discriminant for Bdt {
    fn name(&self) -> &str {
        &self.name
    }

    fn variables(&self) -> &[String] {
        &self.variables
    }

    fn compute(&self, features: &[f64]) -> f64 {
        match self.boost_type {
            BoostType::Grad => {
                let sum: f64 = self
                    .trees
                    .iter()
                    .map(|tree| tree.leaf(features).response)
                    .sum();
                2.0 / (1.0 + f64::exp(-2.0 * sum)) - 1.0
            }
            BoostType::Weighted { yes_no_leaf } => {
                let (vote, norm) =
                    self.trees
                        .iter()
                        .fold((0.0, 0.0), |(vote, norm), tree| {
                            let leaf = tree.leaf(features);
                            let value = if yes_no_leaf {
                                leaf.node_type as f64
                            } else {
                                leaf.purity
                            };
                            (vote + tree.boost_weight * value, norm + tree.boost_weight)
                        });
                if norm > f64::EPSILON {
                    vote / norm
                } else {
                    0.0
                }
            }
        }
    }
}
